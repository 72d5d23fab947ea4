use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    DomainError, EncodedAudio, GenerationParams, ModelFamily, ModelVariant, MonoAudio, RawAudio,
    ReferenceAudio, StoredObject,
};

/// A loaded pretrained model. Handles are shared between invocations, so
/// generation settings travel with each call instead of living on the model.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    fn model_id(&self) -> &str;
    fn sample_rate_hz(&self) -> u32;
    async fn generate(&self, params: GenerationParams) -> Result<RawAudio, DomainError>;
}

#[async_trait]
pub trait ModelRegistryPort: Send + Sync {
    async fn load(
        &self,
        family: ModelFamily,
        variant: ModelVariant,
    ) -> Result<Arc<dyn GenerativeModel>, DomainError>;
}

#[async_trait]
pub trait ReferenceAudioPort: Send + Sync {
    async fn load(&self, path: &Path) -> Result<ReferenceAudio, DomainError>;
}

#[async_trait]
pub trait AudioEncoderPort: Send + Sync {
    /// Writes `audio` under `stem` on local storage and returns the file
    /// together with its bytes as read back from disk.
    async fn encode(&self, audio: MonoAudio, stem: &str) -> Result<EncodedAudio, DomainError>;
}

#[async_trait]
pub trait ObjectStoragePort: Send + Sync {
    async fn upload(&self, file: &Path, key: &str, content_type: &str)
        -> Result<StoredObject, DomainError>;
}

#[async_trait]
pub trait DependencyProbe: Send + Sync {
    fn dependency_name(&self) -> &'static str;
    async fn is_available(&self) -> bool;
}
