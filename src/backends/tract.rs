//! Tract backend for running background removal models using pure Rust inference
//!
//! Tract needs no native runtime, which keeps the server a single static binary.

use crate::error::{BgRemovalError, Result};
use crate::inference::InferenceBackend;
use crate::models::{ModelFiles, PreprocessingConfig};
use ndarray::Array4;
use std::time::Instant;
use tract_onnx::prelude::*;

/// Type alias for the optimized, runnable Tract plan
type TractModel = RunnableModel<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Tract backend holding an optimized plan for a fixed input size
#[derive(Debug)]
pub struct TractBackend {
    model: TractModel,
    preprocessing: PreprocessingConfig,
}

impl TractBackend {
    /// Load and optimize an ONNX model
    ///
    /// The input is pinned to `1x3xSxS` with `S = preprocessing.target_size`
    /// so that Tract can fully type and optimize the graph.
    ///
    /// # Errors
    /// - Model file unreadable or not valid ONNX
    /// - Graph cannot be typed or optimized for the pinned input shape
    pub fn load(files: &ModelFiles, preprocessing: PreprocessingConfig) -> Result<Self> {
        preprocessing.validate()?;
        let load_start = Instant::now();
        let size = preprocessing.target_size as usize;

        tracing::info!(
            model = %files.model_file.display(),
            target_size = size,
            "Initializing Tract backend"
        );

        let model = tract_onnx::onnx()
            .model_for_path(&files.model_file)
            .map_err(|e| BgRemovalError::model(format!("Failed to load ONNX model: {e}")))?
            .with_input_fact(0, f32::fact([1, 3, size, size]).into())
            .map_err(|e| BgRemovalError::model(format!("Failed to set input shape: {e}")))?
            .into_optimized()
            .map_err(|e| BgRemovalError::model(format!("Failed to optimize model: {e}")))?
            .into_runnable()
            .map_err(|e| {
                BgRemovalError::model(format!("Failed to create runnable model: {e}"))
            })?;

        tracing::info!(
            elapsed_ms = load_start.elapsed().as_millis() as u64,
            "Tract backend initialized"
        );

        Ok(Self {
            model,
            preprocessing,
        })
    }
}

impl InferenceBackend for TractBackend {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn infer(&self, input: &Array4<f32>) -> Result<Array4<f32>> {
        let inference_start = Instant::now();
        let input_tensor = Tensor::from(input.clone());

        let outputs = self
            .model
            .run(tvec![input_tensor.into()])
            .map_err(|e| BgRemovalError::inference(format!("Tract inference failed: {e}")))?;

        let output = outputs
            .into_iter()
            .next()
            .ok_or_else(|| BgRemovalError::inference("No output tensor found"))?;

        let view = output.to_array_view::<f32>().map_err(|e| {
            BgRemovalError::inference(format!("Failed to convert output tensor: {e}"))
        })?;

        let array = view
            .to_owned()
            .into_dimensionality::<ndarray::Ix4>()
            .map_err(|_| {
                BgRemovalError::inference(format!(
                    "Expected 4D output tensor, got shape {:?}",
                    view.shape()
                ))
            })?;

        tracing::debug!(
            elapsed_ms = inference_start.elapsed().as_millis() as u64,
            output_shape = ?array.shape(),
            "Tract inference completed"
        );

        Ok(array)
    }

    fn preprocessing_config(&self) -> &PreprocessingConfig {
        &self.preprocessing
    }
}
