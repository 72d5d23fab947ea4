use std::borrow::Cow;

use serde::Deserialize;
use validator::{Validate, ValidationError};

/// Caller input shared by every generation family. Defaults for absent
/// fields depend on the family and are applied during validation.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct GenerateAudioRequest {
    pub prompt: Option<String>,
    pub duration: Option<i64>,
    pub model_size: Option<String>,
    #[validate(length(min = 1, max = 4096, message = "Melody path is required"))]
    pub melody_path: Option<String>,
    #[validate(
        length(
            min = 1,
            max = 128,
            message = "message_deduplication_id must be 1-128 characters without '/'"
        ),
        custom(function = "single_path_segment")
    )]
    pub message_deduplication_id: Option<String>,
}

impl GenerateAudioRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: Some(prompt.into()),
            ..Self::default()
        }
    }

    pub fn with_duration(mut self, duration: i64) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_model_size(mut self, model_size: impl Into<String>) -> Self {
        self.model_size = Some(model_size.into());
        self
    }

    pub fn with_melody_path(mut self, melody_path: impl Into<String>) -> Self {
        self.melody_path = Some(melody_path.into());
        self
    }

    pub fn with_deduplication_id(mut self, id: impl Into<String>) -> Self {
        self.message_deduplication_id = Some(id.into());
        self
    }
}

fn single_path_segment(value: &str) -> Result<(), ValidationError> {
    if value.contains('/') || value.trim().is_empty() {
        return Err(ValidationError::new("path_segment").with_message(Cow::Borrowed(
            "message_deduplication_id must be 1-128 characters without '/'",
        )));
    }
    Ok(())
}
