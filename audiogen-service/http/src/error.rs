use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use audiogen_application::{ErrorKind, GenerationFailure, GenerationOutcome};

/// Failures raised by the HTTP layer itself, before a request reaches the
/// generation pipeline. Rendered with the same body as pipeline failures.
#[derive(Debug)]
pub enum HttpError {
    Validation { message: String },
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (error, error_kind) = match self {
            HttpError::Validation { message } => (message, ErrorKind::Validation),
        };

        outcome_response(GenerationOutcome::Failure(GenerationFailure { error, error_kind }))
    }
}

impl From<JsonRejection> for HttpError {
    fn from(rejection: JsonRejection) -> Self {
        HttpError::Validation {
            message: format!("Invalid request body: {}", rejection.body_text()),
        }
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Configuration => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Dependency | ErrorKind::Generation | ErrorKind::Storage => {
            StatusCode::BAD_GATEWAY
        }
        ErrorKind::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn outcome_response(outcome: GenerationOutcome) -> Response {
    let status = outcome
        .error()
        .map(|failure| status_for(failure.error_kind))
        .unwrap_or(StatusCode::OK);
    (status, Json(outcome)).into_response()
}
