//! Mock backends for testing the local pipeline without model files

use crate::{
    error::{BgRemovalError, Result},
    inference::InferenceBackend,
    models::PreprocessingConfig,
};
use ndarray::Array4;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Mock backend that predicts a fixed mask
#[derive(Debug)]
pub struct MockBackend {
    preprocessing: PreprocessingConfig,
    /// Value written to every output cell
    fill: f32,
    /// Whether to simulate inference failure
    should_fail_inference: bool,
    calls: AtomicUsize,
}

impl MockBackend {
    /// Mock backend marking everything as foreground
    #[must_use]
    pub fn new() -> Self {
        Self {
            preprocessing: PreprocessingConfig {
                target_size: 32,
                normalization_mean: [0.5, 0.5, 0.5],
                normalization_std: [1.0, 1.0, 1.0],
            },
            fill: 1.0,
            should_fail_inference: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Mock backend predicting `fill` everywhere
    #[must_use]
    pub fn with_fill(fill: f32) -> Self {
        Self {
            fill,
            ..Self::new()
        }
    }

    /// Create a mock backend that will fail during inference
    #[must_use]
    pub fn new_failing_inference() -> Self {
        Self {
            should_fail_inference: true,
            ..Self::new()
        }
    }

    /// Number of `infer` calls so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InferenceBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn infer(&self, input: &Array4<f32>) -> Result<Array4<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.should_fail_inference {
            return Err(BgRemovalError::inference("Mock inference failure"));
        }

        let shape = input.shape();
        let (height, width) = (
            shape.get(2).copied().unwrap_or(0),
            shape.get(3).copied().unwrap_or(0),
        );
        Ok(Array4::from_elem((1, 1, height, width), self.fill))
    }

    fn preprocessing_config(&self) -> &PreprocessingConfig {
        &self.preprocessing
    }
}
