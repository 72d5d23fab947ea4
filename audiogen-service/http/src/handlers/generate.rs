use axum::{
    extract::{rejection::JsonRejection, State},
    response::Response,
    Json,
};

use audiogen_application::GenerateAudioRequest;
use audiogen_domain::ModelFamily;

use crate::error::{outcome_response, HttpError};
use crate::AppState;

pub async fn generate_sound_effect(
    State(state): State<AppState>,
    payload: Result<Json<GenerateAudioRequest>, JsonRejection>,
) -> Result<Response, HttpError> {
    generate(state, ModelFamily::SoundEffect, payload).await
}

pub async fn generate_music(
    State(state): State<AppState>,
    payload: Result<Json<GenerateAudioRequest>, JsonRejection>,
) -> Result<Response, HttpError> {
    generate(state, ModelFamily::Music, payload).await
}

pub async fn generate_music_with_melody(
    State(state): State<AppState>,
    payload: Result<Json<GenerateAudioRequest>, JsonRejection>,
) -> Result<Response, HttpError> {
    generate(state, ModelFamily::MelodyMusic, payload).await
}

async fn generate(
    state: AppState,
    family: ModelFamily,
    payload: Result<Json<GenerateAudioRequest>, JsonRejection>,
) -> Result<Response, HttpError> {
    let Json(request) = payload.inspect_err(|rejection| {
        tracing::warn!(family = %family, error = %rejection.body_text(), "rejected request body");
    })?;

    if request.prompt.as_deref().map_or(true, str::is_empty) {
        return Err(HttpError::Validation {
            message: "prompt is required".to_string(),
        });
    }

    tracing::info!(
        family = %family,
        duration = ?request.duration,
        model_size = request.model_size.as_deref().unwrap_or("default"),
        deduplication_id = request.message_deduplication_id.as_deref().unwrap_or("none"),
        "received generate request"
    );

    let outcome = state.generate.generate(family, request).await;

    match outcome.error() {
        None => tracing::info!(family = %family, "generate request completed"),
        Some(failure) => tracing::warn!(
            family = %family,
            kind = ?failure.error_kind,
            error = %failure.error,
            "generate request failed"
        ),
    }

    Ok(outcome_response(outcome))
}
