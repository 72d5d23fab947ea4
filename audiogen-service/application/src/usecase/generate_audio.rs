use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;

use audiogen_domain::{
    ArtifactName, AudioEncoderPort, AudioFormat, DomainError, GenerationParams, ModelFamily,
    ModelRegistryPort, ObjectStoragePort, ReferenceAudioPort,
};

use crate::{
    validate_request, ApplicationError, Clock, GenerateAudioRequest, GenerationOutcome,
    GenerationSuccess, StorageLocation,
};

const PROMPT_PREVIEW_CHARS: usize = 100;

#[async_trait]
pub trait GenerateAudioUseCase: Send + Sync {
    /// Never fails: every error is folded into the returned outcome.
    async fn generate(
        &self,
        family: ModelFamily,
        request: GenerateAudioRequest,
    ) -> GenerationOutcome;
}

#[derive(Debug, Clone)]
pub struct GenerationSettings {
    /// Well-known names of required credentials that are absent.
    pub missing_credentials: Vec<String>,
    pub generation_timeout: Duration,
    pub retain_local_files: bool,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            missing_credentials: Vec::new(),
            generation_timeout: Duration::from_secs(600),
            retain_local_files: false,
        }
    }
}

pub struct GenerateAudioUseCaseImpl {
    models: Arc<dyn ModelRegistryPort>,
    reference_audio: Arc<dyn ReferenceAudioPort>,
    encoder: Arc<dyn AudioEncoderPort>,
    storage: Arc<dyn ObjectStoragePort>,
    clock: Arc<dyn Clock>,
    settings: GenerationSettings,
}

impl GenerateAudioUseCaseImpl {
    pub fn new(
        models: Arc<dyn ModelRegistryPort>,
        reference_audio: Arc<dyn ReferenceAudioPort>,
        encoder: Arc<dyn AudioEncoderPort>,
        storage: Arc<dyn ObjectStoragePort>,
        clock: Arc<dyn Clock>,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            models,
            reference_audio,
            encoder,
            storage,
            clock,
            settings,
        }
    }

    async fn run(
        &self,
        family: ModelFamily,
        raw: GenerateAudioRequest,
    ) -> Result<GenerationSuccess, ApplicationError> {
        let request = validate_request(family, raw, &self.settings.missing_credentials)?;

        tracing::info!(
            family = %family,
            variant = %request.variant,
            duration_secs = request.duration_secs,
            prompt = %preview(&request.prompt),
            deduplication_id = request.deduplication_id.as_deref().unwrap_or("none"),
            "starting generation"
        );

        let model = self
            .models
            .load(family, request.variant)
            .await
            .map_err(ApplicationError::ModelLoad)?;

        let melody = match &request.melody_path {
            Some(path) => {
                let melody = self
                    .reference_audio
                    .load(path)
                    .await
                    .map_err(ApplicationError::ReferenceAudio)?;
                tracing::debug!(
                    melody_path = %path.display(),
                    sample_rate_hz = melody.sample_rate_hz,
                    frames = melody.frame_count(),
                    "loaded reference melody"
                );
                Some(melody)
            }
            None => None,
        };

        let label = family.label();
        let params = GenerationParams {
            prompt: request.prompt.clone(),
            duration_secs: request.duration_secs,
            melody,
        };
        let raw_audio = tokio::time::timeout(self.settings.generation_timeout, model.generate(params))
            .await
            .map_err(|_| ApplicationError::Generation {
                label,
                source: DomainError::external_service_error(
                    "model",
                    &format!(
                        "generation exceeded {}s",
                        self.settings.generation_timeout.as_secs()
                    ),
                ),
            })?
            .map_err(|source| ApplicationError::Generation { label, source })?;

        let audio = raw_audio
            .into_mono()
            .map_err(|source| ApplicationError::Generation { label, source })?;
        let sampling_rate = audio.sample_rate_hz;
        tracing::info!(
            model_id = model.model_id(),
            sample_rate_hz = sampling_rate,
            samples = audio.samples.len(),
            "generation completed"
        );

        let format = AudioFormat::Wav;
        let name = ArtifactName::new(
            family,
            request.deduplication_id.as_deref(),
            self.clock.now(),
            format,
        );
        let encoded = self
            .encoder
            .encode(audio, &name.stem)
            .await
            .map_err(ApplicationError::Encoding)?;
        tracing::debug!(path = %encoded.path.display(), bytes = encoded.bytes.len(), "saved locally");

        let (storage, storage_error) = match self
            .storage
            .upload(&encoded.path, &name.key, format.content_type())
            .await
        {
            Ok(object) => {
                tracing::info!(s3_uri = %object.uri, "uploaded generated audio");
                (Some(StorageLocation::from(object)), None)
            }
            Err(err) => {
                let error = ApplicationError::Storage(err);
                tracing::warn!(
                    stage = error.stage(),
                    key = %name.key,
                    error = %error,
                    "upload failed, returning audio inline only"
                );
                (None, Some(error.to_string()))
            }
        };

        if !self.settings.retain_local_files {
            if let Err(err) = tokio::fs::remove_file(&encoded.path).await {
                tracing::warn!(path = %encoded.path.display(), error = %err, "could not remove local file");
            }
        }

        Ok(GenerationSuccess {
            file_size_bytes: encoded.bytes.len(),
            audio: encoded.bytes,
            sampling_rate,
            duration: request.duration_secs,
            format: encoded.format,
            filename: encoded.filename,
            storage,
            storage_error,
            prompt_used: request.prompt,
            model_size: request.variant,
            melody_path: request
                .melody_path
                .map(|path| path.to_string_lossy().into_owned()),
            message_deduplication_id: request.deduplication_id,
        })
    }
}

#[async_trait]
impl GenerateAudioUseCase for GenerateAudioUseCaseImpl {
    async fn generate(
        &self,
        family: ModelFamily,
        request: GenerateAudioRequest,
    ) -> GenerationOutcome {
        let result = match AssertUnwindSafe(self.run(family, request))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(panic) => Err(ApplicationError::Unexpected(panic_message(panic.as_ref()))),
        };

        if let Err(error) = &result {
            tracing::error!(
                family = %family,
                stage = error.stage(),
                kind = ?error.kind(),
                error = %error,
                "generation failed"
            );
        }

        GenerationOutcome::from(result)
    }
}

fn preview(prompt: &str) -> String {
    let mut chars = prompt.chars();
    let head: String = chars.by_ref().take(PROMPT_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "generation pipeline panicked".to_string()
    }
}
