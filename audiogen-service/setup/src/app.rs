use std::sync::Arc;
use std::time::Duration;

use anyhow::Error;
use audiogen_application::{
    GenerateAudioUseCase, GenerateAudioUseCaseImpl, GenerationSettings, HealthUseCase,
    HealthUseCaseImpl, SystemClock,
};
use audiogen_configuration::{AppConfig, AudioConfig, ModelConfig, ServerConfig, StorageConfig};
use audiogen_domain::{DependencyProbe, ModelRegistryPort};
use audiogen_http_server::{create_app_routes, AppState};
use audiogen_infra_audio::{LoudnessSettings, WavFileEncoder, WavReferenceAudioLoader};
use audiogen_infra_model::{CachedModelRegistry, ModelBackendSettings, RestModelRegistry};
use audiogen_infra_storage::{S3ObjectStorage, StorageSettings};

pub async fn build_and_run(config: AppConfig, server_config: ServerConfig) -> Result<(), Error> {
    let app = Application::new(config).await?;
    app.run(server_config).await
}

pub struct Application {
    pub config: AppConfig,
    pub state: AppState,
}

impl Application {
    pub async fn new(config: AppConfig) -> Result<Self, Error> {
        let missing_credentials = config.missing_credentials();
        tracing::info!(
            model_endpoint = %config.model.endpoint,
            bucket = %config.storage.bucket,
            region = %config.storage.region,
            output_dir = %config.generation.output_dir.display(),
            credentials_complete = missing_credentials.is_empty(),
            "initializing audio generation application"
        );
        if !missing_credentials.is_empty() {
            tracing::warn!(
                missing = %missing_credentials.join(", "),
                "storage credentials are incomplete; generation requests will be rejected"
            );
        }

        let backend = Arc::new(RestModelRegistry::new(model_settings(&config.model))?);
        let models: Arc<dyn ModelRegistryPort> =
            Arc::new(CachedModelRegistry::new(backend.clone()));
        let encoder = Arc::new(WavFileEncoder::new(
            config.generation.output_dir.clone(),
            loudness_settings(&config.audio),
        ));
        let storage = Arc::new(S3ObjectStorage::new(storage_settings(&config.storage)));

        let generate: Arc<dyn GenerateAudioUseCase> = Arc::new(GenerateAudioUseCaseImpl::new(
            models,
            Arc::new(WavReferenceAudioLoader::new()),
            encoder.clone(),
            storage.clone(),
            Arc::new(SystemClock),
            GenerationSettings {
                missing_credentials: missing_credentials.clone(),
                generation_timeout: Duration::from_secs(config.generation.timeout_secs.max(1)),
                retain_local_files: config.generation.retain_local_files,
            },
        ));

        let probes: Vec<Arc<dyn DependencyProbe>> =
            vec![backend as Arc<dyn DependencyProbe>, encoder, storage];
        let health: Arc<dyn HealthUseCase> =
            Arc::new(HealthUseCaseImpl::new(missing_credentials, probes));

        Ok(Self {
            config,
            state: AppState::new(generate, health),
        })
    }

    pub async fn run(self, server_config: ServerConfig) -> Result<(), Error> {
        tracing::info!(
            host = %server_config.host,
            port = server_config.port,
            "starting audio generation http server"
        );

        create_app_routes(self.state, server_config)
            .await
            .map_err(|err| anyhow::anyhow!("server startup failed: {err}"))
    }
}

fn model_settings(config: &ModelConfig) -> ModelBackendSettings {
    ModelBackendSettings {
        endpoint: config.endpoint.clone(),
        provider_token: config.provider_token.clone(),
        cache_dir: config.cache_dir.clone(),
        request_timeout: Duration::from_secs(config.request_timeout_secs.max(1)),
        connect_timeout: Duration::from_secs(config.connect_timeout_secs.max(1)),
    }
}

fn storage_settings(config: &StorageConfig) -> StorageSettings {
    StorageSettings {
        bucket: config.bucket.clone(),
        region: config.region.clone(),
        access_key_id: config.access_key_id.clone(),
        secret_access_key: config.secret_access_key.clone(),
        endpoint_url: config.endpoint_url.clone(),
    }
}

fn loudness_settings(config: &AudioConfig) -> LoudnessSettings {
    LoudnessSettings {
        loudness_headroom_db: config.loudness_headroom_db,
        loudness_compressor: config.loudness_compressor,
        energy_floor: config.energy_floor,
    }
}

#[cfg(test)]
mod tests {
    use audiogen_application::{ErrorKind, GenerateAudioRequest};
    use audiogen_domain::ModelFamily;

    use super::*;

    #[tokio::test]
    async fn missing_credentials_reject_generation_before_any_backend_call() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = AppConfig::default();
        config.generation.output_dir = dir.path().to_path_buf();
        config.model.endpoint = "http://127.0.0.1:1".to_string();

        let app = Application::new(config).await.expect("application builds");
        let outcome = app
            .state
            .generate
            .generate(ModelFamily::Music, GenerateAudioRequest::new("ambient pads"))
            .await;

        let failure = outcome.error().expect("failure");
        assert_eq!(failure.error_kind, ErrorKind::Configuration);
        assert_eq!(
            failure.error,
            "Missing AWS credentials: AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY, S3_BUCKET_NAME"
        );
    }

    #[test]
    fn timeouts_never_drop_to_zero() {
        let settings = model_settings(&ModelConfig {
            request_timeout_secs: 0,
            connect_timeout_secs: 0,
            ..ModelConfig::default()
        });
        assert_eq!(settings.request_timeout, Duration::from_secs(1));
        assert_eq!(settings.connect_timeout, Duration::from_secs(1));
    }

    #[test]
    fn audio_config_maps_onto_loudness_settings() {
        let loudness = loudness_settings(&AudioConfig::default());
        assert_eq!(loudness, LoudnessSettings::default());
    }
}
