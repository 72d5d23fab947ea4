use chrono::NaiveDateTime;

use crate::{AudioFormat, ModelFamily};

pub const DEFAULT_STORAGE_PREFIX: &str = "audio";
pub const STORAGE_SCHEME: &str = "s3";

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Local file name and object key of one generated artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactName {
    pub stem: String,
    pub filename: String,
    pub key: String,
}

impl ArtifactName {
    pub fn new(
        family: ModelFamily,
        deduplication_id: Option<&str>,
        generated_at: NaiveDateTime,
        format: AudioFormat,
    ) -> Self {
        let timestamp = generated_at.format(TIMESTAMP_FORMAT);
        let stem = match deduplication_id {
            Some(token) => format!("{}_{token}_{timestamp}", token_file_prefix(family)),
            None => format!("{}_{timestamp}", default_file_prefix(family)),
        };
        let filename = format!("{stem}.{}", format.extension());
        let key = match deduplication_id {
            Some(token) => format!("{}/{token}/{filename}", token_storage_prefix(family)),
            None => format!("{DEFAULT_STORAGE_PREFIX}/{filename}"),
        };

        Self {
            stem,
            filename,
            key,
        }
    }
}

pub fn storage_uri(bucket: &str, key: &str) -> String {
    format!("{STORAGE_SCHEME}://{bucket}/{key}")
}

fn token_file_prefix(family: ModelFamily) -> &'static str {
    match family {
        ModelFamily::SoundEffect => "audiogen",
        ModelFamily::Music => "musicgen",
        ModelFamily::MelodyMusic => "musicgen_melody",
    }
}

fn default_file_prefix(family: ModelFamily) -> &'static str {
    match family {
        ModelFamily::SoundEffect => "generated_audio",
        ModelFamily::Music => "generated_music",
        ModelFamily::MelodyMusic => "generated_music_melody",
    }
}

fn token_storage_prefix(family: ModelFamily) -> &'static str {
    match family {
        ModelFamily::SoundEffect => "audiogen",
        ModelFamily::Music | ModelFamily::MelodyMusic => "musicgen",
    }
}
