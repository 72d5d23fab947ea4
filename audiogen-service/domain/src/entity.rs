use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::DomainError;

pub const MIN_DURATION_SECS: u32 = 1;
pub const MAX_DURATION_SECS: u32 = 300;

/// Generation entry family. Each family owns its model set, defaults and
/// artifact naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFamily {
    SoundEffect,
    Music,
    MelodyMusic,
}

impl ModelFamily {
    pub fn allowed_variants(self) -> &'static [ModelVariant] {
        match self {
            ModelFamily::SoundEffect => &[ModelVariant::Medium],
            ModelFamily::Music => &[
                ModelVariant::Small,
                ModelVariant::Medium,
                ModelVariant::Large,
                ModelVariant::Melody,
            ],
            ModelFamily::MelodyMusic => &[ModelVariant::Melody],
        }
    }

    pub fn default_variant(self) -> ModelVariant {
        match self {
            ModelFamily::SoundEffect => ModelVariant::Medium,
            ModelFamily::Music => ModelVariant::Large,
            ModelFamily::MelodyMusic => ModelVariant::Melody,
        }
    }

    pub fn default_duration_secs(self) -> u32 {
        match self {
            ModelFamily::SoundEffect => 60,
            ModelFamily::Music | ModelFamily::MelodyMusic => 30,
        }
    }

    pub fn supports(self, variant: ModelVariant) -> bool {
        self.allowed_variants().contains(&variant)
    }

    pub fn requires_melody(self) -> bool {
        matches!(self, ModelFamily::MelodyMusic)
    }

    pub fn model_id(self, variant: ModelVariant) -> String {
        match self {
            ModelFamily::SoundEffect => format!("facebook/audiogen-{variant}"),
            ModelFamily::Music | ModelFamily::MelodyMusic => {
                format!("facebook/musicgen-{variant}")
            }
        }
    }

    /// Capitalized noun used in caller-facing messages.
    pub fn label(self) -> &'static str {
        match self {
            ModelFamily::SoundEffect => "Audio",
            ModelFamily::Music | ModelFamily::MelodyMusic => "Music",
        }
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelFamily::SoundEffect => "sound_effect",
            ModelFamily::Music => "music",
            ModelFamily::MelodyMusic => "melody_music",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelVariant {
    Small,
    Medium,
    Large,
    Melody,
}

impl ModelVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            ModelVariant::Small => "small",
            ModelVariant::Medium => "medium",
            ModelVariant::Large => "large",
            ModelVariant::Melody => "melody",
        }
    }
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelVariant {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "small" => Ok(ModelVariant::Small),
            "medium" => Ok(ModelVariant::Medium),
            "large" => Ok(ModelVariant::Large),
            "melody" => Ok(ModelVariant::Melody),
            other => Err(DomainError::invalid_input(&format!(
                "unknown model variant `{other}`"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Wav,
}

impl AudioFormat {
    pub fn extension(self) -> &'static str {
        match self {
            AudioFormat::Wav => "wav",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            AudioFormat::Wav => "audio/wav",
        }
    }
}

/// A request that passed validation. Built once per invocation and consumed
/// by the generation pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub family: ModelFamily,
    pub prompt: String,
    pub duration_secs: u32,
    pub variant: ModelVariant,
    pub melody_path: Option<PathBuf>,
    pub deduplication_id: Option<String>,
}

/// Model output before downmixing. One `Vec` per channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawAudio {
    pub sample_rate_hz: u32,
    pub channels: Vec<Vec<f32>>,
}

pub type ReferenceAudio = RawAudio;

#[derive(Debug, Clone, PartialEq)]
pub struct MonoAudio {
    pub sample_rate_hz: u32,
    pub samples: Vec<f32>,
}

impl RawAudio {
    /// Averages every channel into one. Frames past the shortest channel are
    /// dropped.
    pub fn into_mono(self) -> Result<MonoAudio, DomainError> {
        if self.sample_rate_hz == 0 {
            return Err(DomainError::invalid_input(
                "model returned audio with a zero sample rate",
            ));
        }

        let mut channels = self.channels;
        let samples = match channels.len() {
            0 => {
                return Err(DomainError::invalid_input(
                    "model returned audio without channels",
                ))
            }
            1 => channels.swap_remove(0),
            count => {
                let frames = channels.iter().map(Vec::len).min().unwrap_or(0);
                let scale = 1.0 / count as f32;
                (0..frames)
                    .map(|frame| channels.iter().map(|ch| ch[frame]).sum::<f32>() * scale)
                    .collect()
            }
        };

        Ok(MonoAudio {
            sample_rate_hz: self.sample_rate_hz,
            samples,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.channels.iter().map(Vec::len).min().unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
pub struct GenerationParams {
    pub prompt: String,
    pub duration_secs: u32,
    pub melody: Option<ReferenceAudio>,
}

#[derive(Debug, Clone)]
pub struct EncodedAudio {
    pub path: PathBuf,
    pub filename: String,
    pub format: AudioFormat,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    pub bucket: String,
    pub key: String,
    pub uri: String,
}
