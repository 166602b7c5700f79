//! Process lifecycle: the local model singleton and its startup loader
//!
//! The slot starts empty and is filled exactly once. `OnceLock` publishes the
//! model only after it is fully constructed, so readers either see "not ready"
//! or a complete model, and steady-state reads take no lock.

use crate::{
    config::LocalModelConfig,
    error::{BgRemovalError, Result},
    processor::OpenSourceModel,
    provider::BackgroundRemover,
};
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use tokio::task::JoinHandle;

/// Readiness-checked holder for the process-wide local model
#[derive(Default)]
pub struct ModelSlot {
    model: OnceLock<Arc<dyn BackgroundRemover>>,
}

impl ModelSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the local model has been installed
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.model.get().is_some()
    }

    /// The installed model
    ///
    /// # Errors
    /// - `ModelUnavailable` before installation
    pub fn get(&self) -> Result<Arc<dyn BackgroundRemover>> {
        self.model
            .get()
            .cloned()
            .ok_or(BgRemovalError::ModelUnavailable)
    }

    /// Install the model. Only the first call succeeds.
    ///
    /// # Errors
    /// - A model is already installed
    pub fn install(&self, model: Arc<dyn BackgroundRemover>) -> Result<()> {
        self.model
            .set(model)
            .map_err(|_| BgRemovalError::internal("Local model is already installed"))
    }
}

impl std::fmt::Debug for ModelSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSlot")
            .field("ready", &self.is_ready())
            .finish()
    }
}

/// Run `load` on the blocking pool and install its result into `slot`.
///
/// A failed load is logged and leaves the slot empty; the remote path keeps working.
/// The returned handle resolves to whether the model was installed.
pub fn spawn_loader<F>(slot: Arc<ModelSlot>, load: F) -> JoinHandle<bool>
where
    F: FnOnce() -> Result<Arc<dyn BackgroundRemover>> + Send + 'static,
{
    tokio::spawn(async move {
        tracing::info!("Loading local model");
        let started = Instant::now();

        let loaded = match tokio::task::spawn_blocking(load).await {
            Ok(result) => result,
            Err(e) => Err(BgRemovalError::internal(format!("Model loader panicked: {e}"))),
        };

        match loaded.and_then(|model| slot.install(model)) {
            Ok(()) => {
                tracing::info!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Local model loaded and ready for inference"
                );
                true
            },
            Err(e) => {
                tracing::error!(error = %e, "Local model failed to load; only API-key requests can be served");
                false
            },
        }
    })
}

/// Load the configured [`OpenSourceModel`] in the background
pub fn spawn_model_loader(slot: Arc<ModelSlot>, config: LocalModelConfig) -> JoinHandle<bool> {
    spawn_loader(slot, move || {
        let model = OpenSourceModel::load(&config)?;
        Ok(Arc::new(model) as Arc<dyn BackgroundRemover>)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProcessedImage;
    use async_trait::async_trait;
    use image::DynamicImage;

    struct NoopRemover;

    #[async_trait]
    impl BackgroundRemover for NoopRemover {
        fn name(&self) -> &'static str {
            "noop"
        }

        async fn remove_background(&self, image: DynamicImage) -> Result<ProcessedImage> {
            Ok(ProcessedImage::from_rgba(image.to_rgba8()))
        }
    }

    #[test]
    fn test_slot_starts_not_ready() {
        let slot = ModelSlot::new();
        assert!(!slot.is_ready());
        assert!(matches!(slot.get(), Err(BgRemovalError::ModelUnavailable)));
        assert_eq!(format!("{slot:?}"), "ModelSlot { ready: false }");
    }

    #[test]
    fn test_slot_installs_once() {
        let slot = ModelSlot::new();
        slot.install(Arc::new(NoopRemover)).unwrap();
        assert!(slot.is_ready());
        assert_eq!(slot.get().unwrap().name(), "noop");

        assert!(slot.install(Arc::new(NoopRemover)).is_err());
        assert!(slot.is_ready());
    }

    #[tokio::test]
    async fn test_loader_installs_model() {
        let slot = Arc::new(ModelSlot::new());
        let installed = spawn_loader(slot.clone(), || {
            let model: Arc<dyn BackgroundRemover> = Arc::new(NoopRemover);
            Ok(model)
        })
            .await
            .unwrap();
        assert!(installed);
        assert!(slot.is_ready());
    }

    #[tokio::test]
    async fn test_loader_failure_leaves_slot_empty() {
        let slot = Arc::new(ModelSlot::new());
        let installed = spawn_loader(slot.clone(), || Err(BgRemovalError::model("missing weights")))
            .await
            .unwrap();
        assert!(!installed);
        assert!(!slot.is_ready());
    }

    #[tokio::test]
    async fn test_model_loader_without_path_fails() {
        let slot = Arc::new(ModelSlot::new());
        let installed = spawn_model_loader(slot.clone(), LocalModelConfig::default())
            .await
            .unwrap();
        assert!(!installed);
        assert!(!slot.is_ready());
    }
}
