use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};

use audiogen_domain::{
    DependencyProbe, DomainError, GenerationParams, GenerativeModel, ModelFamily,
    ModelRegistryPort, ModelVariant, RawAudio, ReferenceAudio,
};

const SERVICE: &str = "model_backend";

#[derive(Debug, Clone)]
pub struct ModelBackendSettings {
    pub endpoint: String,
    pub provider_token: Option<String>,
    pub cache_dir: Option<String>,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ModelBackendSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:9000".to_string(),
            provider_token: None,
            cache_dir: None,
            request_timeout: Duration::from_secs(900),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Serialize)]
struct LoadModelRequest<'a> {
    model_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    cache_dir: Option<&'a str>,
}

#[derive(Deserialize)]
struct LoadModelResponse {
    model_id: String,
    sample_rate_hz: u32,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model_id: &'a str,
    prompt: &'a str,
    duration_secs: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    melody: Option<&'a ReferenceAudio>,
}

/// Shared transport for the registry and every model handle it hands out.
#[derive(Debug)]
struct BackendClient {
    client: Client,
    base_url: String,
    provider_token: Option<String>,
}

impl BackendClient {
    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.provider_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, DomainError>
    where
        B: Serialize + ?Sized,
        T: for<'de> Deserialize<'de>,
    {
        let request = self.authorize(self.client.post(self.url(path)).json(body));
        let response = request.send().await.map_err(|err| self.transport_error(err))?;
        let response = self.check_status(response).await?;
        response.json::<T>().await.map_err(|err| {
            DomainError::external_service_error(SERVICE, &format!("invalid response body: {err}"))
        })
    }

    async fn check_status(&self, response: Response) -> Result<Response, DomainError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(DomainError::external_service_error(
            SERVICE,
            &format!("{status}: {}", body.trim()),
        ))
    }

    fn transport_error(&self, error: reqwest::Error) -> DomainError {
        let message = if error.is_connect() {
            format!("connection refused at {}", self.base_url)
        } else if error.is_timeout() {
            "request timed out".to_string()
        } else {
            error.to_string()
        };
        DomainError::external_service_error(SERVICE, &message)
    }
}

/// Loads pretrained models on a remote inference server.
pub struct RestModelRegistry {
    backend: Arc<BackendClient>,
    cache_dir: Option<String>,
}

impl RestModelRegistry {
    pub fn new(settings: ModelBackendSettings) -> Result<Self, DomainError> {
        let client = Client::builder()
            .timeout(settings.request_timeout)
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| {
                DomainError::internal_error(&format!("cannot build http client: {err}"))
            })?;

        Ok(Self {
            backend: Arc::new(BackendClient {
                client,
                base_url: settings.endpoint.trim_end_matches('/').to_string(),
                provider_token: settings.provider_token.filter(|token| !token.is_empty()),
            }),
            cache_dir: settings.cache_dir,
        })
    }
}

#[async_trait]
impl ModelRegistryPort for RestModelRegistry {
    async fn load(
        &self,
        family: ModelFamily,
        variant: ModelVariant,
    ) -> Result<Arc<dyn GenerativeModel>, DomainError> {
        let model_id = family.model_id(variant);
        tracing::info!(model_id = %model_id, "loading model");

        let loaded: LoadModelResponse = self
            .backend
            .post_json(
                "/v1/models/load",
                &LoadModelRequest {
                    model_id: &model_id,
                    cache_dir: self.cache_dir.as_deref(),
                },
            )
            .await?;

        if loaded.sample_rate_hz == 0 {
            return Err(DomainError::external_service_error(
                SERVICE,
                &format!("model {} reported a zero sample rate", loaded.model_id),
            ));
        }

        tracing::info!(
            model_id = %loaded.model_id,
            sample_rate_hz = loaded.sample_rate_hz,
            "model loaded"
        );

        Ok(Arc::new(RestGenerativeModel {
            backend: Arc::clone(&self.backend),
            model_id: loaded.model_id,
            sample_rate_hz: loaded.sample_rate_hz,
        }))
    }
}

#[async_trait]
impl DependencyProbe for RestModelRegistry {
    fn dependency_name(&self) -> &'static str {
        SERVICE
    }

    async fn is_available(&self) -> bool {
        let request = self
            .backend
            .authorize(self.backend.client.get(self.backend.url("/health")));
        match request.send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                tracing::warn!(status = %response.status(), "model backend is unhealthy");
                false
            }
            Err(err) => {
                tracing::warn!(error = %err, "model backend is unreachable");
                false
            }
        }
    }
}

/// Handle on a model that the inference server already holds in memory.
pub struct RestGenerativeModel {
    backend: Arc<BackendClient>,
    model_id: String,
    sample_rate_hz: u32,
}

#[async_trait]
impl GenerativeModel for RestGenerativeModel {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn sample_rate_hz(&self) -> u32 {
        self.sample_rate_hz
    }

    async fn generate(&self, params: GenerationParams) -> Result<RawAudio, DomainError> {
        let audio: RawAudio = self
            .backend
            .post_json(
                "/v1/generate",
                &GenerateRequest {
                    model_id: &self.model_id,
                    prompt: &params.prompt,
                    duration_secs: params.duration_secs,
                    melody: params.melody.as_ref(),
                },
            )
            .await?;

        tracing::debug!(
            model_id = %self.model_id,
            sample_rate_hz = audio.sample_rate_hz,
            channels = audio.channels.len(),
            frames = audio.frame_count(),
            "model returned audio"
        );
        Ok(audio)
    }
}
