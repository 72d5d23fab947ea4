use axum::{extract::State, http::StatusCode, response::Json};

use audiogen_application::{HealthReport, HealthStatus, PingResponse};

use crate::AppState;

pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let report = state.health.check().await;
    let status = match report.status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, Json(report))
}

pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse::at(chrono::Utc::now().timestamp()))
}
