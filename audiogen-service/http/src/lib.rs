use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;

use audiogen_application::{GenerateAudioUseCase, HealthUseCase};
use audiogen_configuration::ServerConfig;

pub mod error;
pub mod handlers;

pub use error::{outcome_response, status_for, HttpError};
pub use handlers::*;

const MAX_REQUEST_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub generate: Arc<dyn GenerateAudioUseCase>,
    pub health: Arc<dyn HealthUseCase>,
}

impl AppState {
    pub fn new(generate: Arc<dyn GenerateAudioUseCase>, health: Arc<dyn HealthUseCase>) -> Self {
        Self { generate, health }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/ping", get(ping))
        .route("/api/sfx/generate", post(generate_sound_effect))
        .route("/api/music/generate", post(generate_music))
        .route(
            "/api/music/generate-with-melody",
            post(generate_music_with_melody),
        )
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BYTES))
        .with_state(state)
}

/// Serves the API until ctrl-c.
pub async fn create_app_routes(state: AppState, config: ServerConfig) -> anyhow::Result<()> {
    let address = config.address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    tracing::info!(address = %address, "http server listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server error")
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
