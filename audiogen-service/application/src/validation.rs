use std::path::PathBuf;

use audiogen_domain::{
    GenerationRequest, ModelFamily, ModelVariant, MAX_DURATION_SECS, MIN_DURATION_SECS,
};
use validator::{Validate, ValidationErrors};

use crate::{ApplicationError, GenerateAudioRequest};

/// Turns raw caller input into a [`GenerationRequest`]. Checks run in a fixed
/// order and the first failure is returned; nothing here touches a model.
pub fn validate_request(
    family: ModelFamily,
    raw: GenerateAudioRequest,
    missing_credentials: &[String],
) -> Result<GenerationRequest, ApplicationError> {
    if !missing_credentials.is_empty() {
        return Err(ApplicationError::Configuration(format!(
            "Missing AWS credentials: {}",
            missing_credentials.join(", ")
        )));
    }

    let variant = resolve_variant(family, raw.model_size.as_deref())?;

    let duration = raw
        .duration
        .unwrap_or_else(|| i64::from(family.default_duration_secs()));
    let duration_secs = u32::try_from(duration)
        .ok()
        .filter(|secs| (MIN_DURATION_SECS..=MAX_DURATION_SECS).contains(secs))
        .ok_or_else(|| {
            ApplicationError::Validation(format!(
                "Duration must be between {MIN_DURATION_SECS} and {MAX_DURATION_SECS} seconds"
            ))
        })?;

    let prompt = raw
        .prompt
        .clone()
        .filter(|prompt| !prompt.trim().is_empty())
        .ok_or_else(|| ApplicationError::Validation("Prompt cannot be empty".to_string()))?;

    let melody_missing = raw
        .melody_path
        .as_deref()
        .map_or(true, |path| path.trim().is_empty());
    if family.requires_melody() && melody_missing {
        return Err(ApplicationError::Validation(
            "Melody path is required".to_string(),
        ));
    }
    if !family.requires_melody() && raw.melody_path.is_some() {
        return Err(ApplicationError::Validation(
            "melody_path is only accepted for melody-conditioned generation".to_string(),
        ));
    }

    raw.validate()
        .map_err(|errors| ApplicationError::Validation(first_message(&errors)))?;

    Ok(GenerationRequest {
        family,
        prompt,
        duration_secs,
        variant,
        melody_path: raw.melody_path.map(PathBuf::from),
        deduplication_id: raw.message_deduplication_id,
    })
}

fn resolve_variant(
    family: ModelFamily,
    model_size: Option<&str>,
) -> Result<ModelVariant, ApplicationError> {
    let Some(model_size) = model_size else {
        return Ok(family.default_variant());
    };

    model_size
        .parse::<ModelVariant>()
        .ok()
        .filter(|variant| family.supports(*variant))
        .ok_or_else(|| {
            let allowed = family
                .allowed_variants()
                .iter()
                .map(|variant| variant.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            ApplicationError::Validation(format!(
                "Invalid model size. Must be one of: {allowed}"
            ))
        })
}

// Field order is not stable in `ValidationErrors`, so pick by field name.
fn first_message(errors: &ValidationErrors) -> String {
    let mut fields = errors.field_errors().into_iter().collect::<Vec<_>>();
    fields.sort_by(|(left, _), (right, _)| left.cmp(right));

    for (field, field_errors) in fields {
        if let Some(error) = field_errors.first() {
            return match &error.message {
                Some(message) => message.to_string(),
                None => format!("{field} is invalid"),
            };
        }
    }
    "request is invalid".to_string()
}
