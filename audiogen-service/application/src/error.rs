use audiogen_domain::DomainError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    Validation,
    Dependency,
    Generation,
    Storage,
    Unknown,
}

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("{0}")]
    Configuration(String),

    #[error("{0}")]
    Validation(String),

    #[error("Model loading failed: {0}")]
    ModelLoad(DomainError),

    #[error("Melody loading failed: {0}")]
    ReferenceAudio(DomainError),

    #[error("{label} generation failed: {source}")]
    Generation {
        label: &'static str,
        source: DomainError,
    },

    #[error("Audio encoding failed: {0}")]
    Encoding(DomainError),

    #[error("Storage upload failed: {0}")]
    Storage(DomainError),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl ApplicationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApplicationError::Configuration(_) => ErrorKind::Configuration,
            ApplicationError::Validation(_) => ErrorKind::Validation,
            ApplicationError::ModelLoad(_) | ApplicationError::ReferenceAudio(_) => {
                ErrorKind::Dependency
            }
            ApplicationError::Generation { .. } => ErrorKind::Generation,
            ApplicationError::Storage(_) => ErrorKind::Storage,
            ApplicationError::Encoding(_) | ApplicationError::Unexpected(_) => ErrorKind::Unknown,
        }
    }

    /// Pipeline stage that produced the error, for log correlation.
    pub fn stage(&self) -> &'static str {
        match self {
            ApplicationError::Configuration(_) => "credentials",
            ApplicationError::Validation(_) => "validate",
            ApplicationError::ModelLoad(_) => "model_load",
            ApplicationError::ReferenceAudio(_) => "reference_audio",
            ApplicationError::Generation { .. } => "generate",
            ApplicationError::Encoding(_) => "encode",
            ApplicationError::Storage(_) => "upload",
            ApplicationError::Unexpected(_) => "unknown",
        }
    }
}
