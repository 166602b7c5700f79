//! Local background removal processor
//!
//! `OpenSourceModel` wraps an [`InferenceBackend`] and runs the full local
//! pipeline: letterbox preprocessing, inference, and mask reconstruction onto
//! the original pixels. The backend is shared read-only across requests.

use crate::{
    config::LocalModelConfig,
    error::{BgRemovalError, Result},
    inference::InferenceBackend,
    provider::{BackgroundRemover, LOCAL_PROVIDER},
    types::ProcessedImage,
    utils::ImagePreprocessor,
};
use async_trait::async_trait;
use image::DynamicImage;
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

/// Local segmentation model
#[derive(Clone)]
pub struct OpenSourceModel {
    backend: Arc<dyn InferenceBackend>,
}

impl OpenSourceModel {
    /// Wrap an already initialized backend
    #[must_use]
    pub fn new(backend: Arc<dyn InferenceBackend>) -> Self {
        Self { backend }
    }

    /// Load the model described by `config`
    ///
    /// Preprocessing comes from the explicit override, then the model
    /// directory's `preprocessor_config.json`, then the defaults.
    ///
    /// # Errors
    /// - No model path configured
    /// - Model files missing or invalid
    /// - Crate built without an inference backend
    pub fn load(config: &LocalModelConfig) -> Result<Self> {
        let Some(path) = config.model_path.as_ref() else {
            return Err(BgRemovalError::model("no local model configured"));
        };

        #[cfg(feature = "tract")]
        {
            let files = crate::models::ModelFiles::resolve(path)?;
            let preprocessing = config
                .preprocessing
                .clone()
                .or_else(|| files.preprocessing.clone())
                .unwrap_or_default();
            let backend = crate::backends::TractBackend::load(&files, preprocessing)?;
            Ok(Self::new(Arc::new(backend)))
        }

        #[cfg(not(feature = "tract"))]
        {
            Err(BgRemovalError::model(format!(
                "Cannot load {}: built without an inference backend",
                path.display()
            )))
        }
    }

    /// Name of the underlying inference backend
    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Run the local pipeline synchronously
    ///
    /// # Errors
    /// - Empty image
    /// - Inference failure or unexpected output shape
    #[instrument(skip(self, image), fields(width = image.width(), height = image.height()))]
    pub fn process(&self, image: &DynamicImage) -> Result<ProcessedImage> {
        let started = Instant::now();

        let input = ImagePreprocessor::preprocess_for_inference(
            image,
            self.backend.preprocessing_config(),
        )?;
        let output = self.backend.infer(&input)?;
        let mask = ImagePreprocessor::tensor_to_mask(&output, (image.width(), image.height()))?;
        let processed = ProcessedImage::from_mask(image, &mask)?;

        tracing::debug!(
            backend = self.backend.name(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Local background removal completed"
        );
        Ok(processed)
    }
}

impl std::fmt::Debug for OpenSourceModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenSourceModel")
            .field("backend", &self.backend.name())
            .finish()
    }
}

#[async_trait]
impl BackgroundRemover for OpenSourceModel {
    fn name(&self) -> &'static str {
        LOCAL_PROVIDER
    }

    async fn remove_background(&self, image: DynamicImage) -> Result<ProcessedImage> {
        let model = self.clone();
        tokio::task::spawn_blocking(move || model.process(&image))
            .await
            .map_err(|e| BgRemovalError::internal(format!("Inference task failed: {e}")))?
    }
}
