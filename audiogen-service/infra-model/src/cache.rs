use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::OnceCell;

use audiogen_domain::{DomainError, GenerativeModel, ModelFamily, ModelRegistryPort, ModelVariant};

type ModelSlot = Arc<OnceCell<Arc<dyn GenerativeModel>>>;

/// Keeps loaded models for the lifetime of the worker.
///
/// Slots are keyed by model id, so `medium` sound effects and `medium` music
/// never share a handle. Concurrent first loads of one model wait on the same
/// slot; a failed load leaves the slot empty for the next caller.
pub struct CachedModelRegistry {
    inner: Arc<dyn ModelRegistryPort>,
    slots: Mutex<HashMap<String, ModelSlot>>,
}

impl CachedModelRegistry {
    pub fn new(inner: Arc<dyn ModelRegistryPort>) -> Self {
        Self {
            inner,
            slots: Mutex::new(HashMap::new()),
        }
    }

    fn slot(&self, model_id: &str) -> Result<ModelSlot, DomainError> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| DomainError::internal_error("model cache lock poisoned"))?;
        Ok(Arc::clone(
            slots
                .entry(model_id.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new())),
        ))
    }

    #[cfg(test)]
    fn cached_models(&self) -> usize {
        self.slots
            .lock()
            .map(|slots| slots.values().filter(|slot| slot.initialized()).count())
            .unwrap_or(0)
    }
}

#[async_trait]
impl ModelRegistryPort for CachedModelRegistry {
    async fn load(
        &self,
        family: ModelFamily,
        variant: ModelVariant,
    ) -> Result<Arc<dyn GenerativeModel>, DomainError> {
        let model_id = family.model_id(variant);
        let slot = self.slot(&model_id)?;

        if let Some(model) = slot.get() {
            tracing::debug!(model_id = %model_id, "model cache hit");
            return Ok(Arc::clone(model));
        }

        let model = slot
            .get_or_try_init(|| self.inner.load(family, variant))
            .await?;
        Ok(Arc::clone(model))
    }
}
