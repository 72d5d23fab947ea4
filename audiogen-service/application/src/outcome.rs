use audiogen_domain::{AudioFormat, ModelVariant, StoredObject};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Serialize, Serializer};

use crate::{ApplicationError, ErrorKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageLocation {
    pub s3_uri: String,
    pub s3_bucket: String,
    pub s3_key: String,
}

impl From<StoredObject> for StorageLocation {
    fn from(object: StoredObject) -> Self {
        Self {
            s3_uri: object.uri,
            s3_bucket: object.bucket,
            s3_key: object.key,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationSuccess {
    #[serde(rename = "audio_base64", serialize_with = "serialize_base64")]
    pub audio: Vec<u8>,
    pub sampling_rate: u32,
    pub duration: u32,
    pub format: AudioFormat,
    pub filename: String,
    pub file_size_bytes: usize,
    #[serde(flatten)]
    pub storage: Option<StorageLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_error: Option<String>,
    pub prompt_used: String,
    pub model_size: ModelVariant,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub melody_path: Option<String>,
    pub message_deduplication_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationFailure {
    pub error: String,
    pub error_kind: ErrorKind,
}

/// Result handed back across the service boundary. Serializes with a
/// `success` flag followed by the fields of the matching variant.
#[derive(Debug, Clone)]
pub enum GenerationOutcome {
    Success(Box<GenerationSuccess>),
    Failure(GenerationFailure),
}

impl GenerationOutcome {
    pub fn failure(error: &ApplicationError) -> Self {
        Self::Failure(GenerationFailure {
            error: error.to_string(),
            error_kind: error.kind(),
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, GenerationOutcome::Success(_))
    }

    pub fn success(&self) -> Option<&GenerationSuccess> {
        match self {
            GenerationOutcome::Success(success) => Some(success),
            GenerationOutcome::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&GenerationFailure> {
        match self {
            GenerationOutcome::Success(_) => None,
            GenerationOutcome::Failure(failure) => Some(failure),
        }
    }
}

impl From<Result<GenerationSuccess, ApplicationError>> for GenerationOutcome {
    fn from(result: Result<GenerationSuccess, ApplicationError>) -> Self {
        match result {
            Ok(success) => Self::Success(Box::new(success)),
            Err(error) => Self::failure(&error),
        }
    }
}

#[derive(Serialize)]
struct Tagged<'a, T> {
    success: bool,
    #[serde(flatten)]
    body: &'a T,
}

impl Serialize for GenerationOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            GenerationOutcome::Success(body) => Tagged {
                success: true,
                body: body.as_ref(),
            }
            .serialize(serializer),
            GenerationOutcome::Failure(body) => Tagged {
                success: false,
                body,
            }
            .serialize(serializer),
        }
    }
}

fn serialize_base64<T, S>(bytes: T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: AsRef<[u8]>,
    S: Serializer,
{
    serializer.serialize_str(&STANDARD.encode(bytes.as_ref()))
}
