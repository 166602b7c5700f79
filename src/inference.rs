//! Inference backend abstraction

use crate::{error::Result, models::PreprocessingConfig};
use ndarray::Array4;

/// A loaded segmentation model.
///
/// Backends are fully initialized on construction and inference takes `&self`,
/// so one instance can serve concurrent requests without locking.
pub trait InferenceBackend: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Run inference on an NCHW input tensor and return the `(1, 1, H, W)` mask tensor
    ///
    /// # Errors
    /// - Model inference failures
    /// - Unexpected output tensor rank or shape
    fn infer(&self, input: &Array4<f32>) -> Result<Array4<f32>>;

    /// Preprocessing the model was exported with
    fn preprocessing_config(&self) -> &PreprocessingConfig;
}
