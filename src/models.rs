//! Local model file discovery and preprocessing metadata
//!
//! A local model is either a single `.onnx` file or a directory in the
//! `HuggingFace` layout (`onnx/model.onnx` + `preprocessor_config.json`).

use crate::error::{BgRemovalError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Candidate graph locations inside a model directory, in lookup order
const MODEL_FILE_CANDIDATES: &[&str] = &["model.onnx", "onnx/model.onnx"];

/// Preprocessor metadata file in `HuggingFace` model directories
const PREPROCESSOR_CONFIG_FILE: &str = "preprocessor_config.json";

/// Preprocessing parameters the model expects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessingConfig {
    /// Square input edge in pixels
    pub target_size: u32,
    /// Per-channel mean in the 0-1 range
    pub normalization_mean: [f32; 3],
    /// Per-channel standard deviation in the 0-1 range
    pub normalization_std: [f32; 3],
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            target_size: 1024,
            normalization_mean: [0.5, 0.5, 0.5],
            normalization_std: [1.0, 1.0, 1.0],
        }
    }
}

impl PreprocessingConfig {
    /// Validate sizes and normalization values
    ///
    /// # Errors
    /// - Zero target size
    /// - Non-positive standard deviation
    pub fn validate(&self) -> Result<()> {
        if self.target_size == 0 {
            return Err(BgRemovalError::config_value_error(
                "target_size",
                self.target_size,
                "> 0",
            ));
        }
        if let Some(std) = self.normalization_std.iter().find(|std| **std <= 0.0) {
            return Err(BgRemovalError::config_value_error(
                "normalization_std",
                std,
                "> 0.0",
            ));
        }
        Ok(())
    }
}

/// `preprocessor_config.json` as published with `HuggingFace` models
#[derive(Debug, Deserialize)]
struct HuggingFacePreprocessor {
    size: HuggingFaceSize,
    /// 0-255 range
    image_mean: Vec<f64>,
    /// 0-255 range
    image_std: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct HuggingFaceSize {
    height: u32,
    width: u32,
}

impl HuggingFacePreprocessor {
    fn into_config(self) -> Result<PreprocessingConfig> {
        if self.size.height != self.size.width {
            return Err(BgRemovalError::invalid_config(format!(
                "Only square model inputs are supported, got {}x{}",
                self.size.width, self.size.height
            )));
        }

        let config = PreprocessingConfig {
            target_size: self.size.width,
            normalization_mean: Self::to_unit_range(&self.image_mean, "image_mean")?,
            normalization_std: Self::to_unit_range(&self.image_std, "image_std")?,
        };
        config.validate()?;
        Ok(config)
    }

    fn to_unit_range(values: &[f64], key: &str) -> Result<[f32; 3]> {
        match values {
            [r, g, b, ..] => Ok([
                (r / 255.0) as f32,
                (g / 255.0) as f32,
                (b / 255.0) as f32,
            ]),
            _ => Err(BgRemovalError::invalid_config(format!(
                "{key} must have at least 3 values"
            ))),
        }
    }
}

/// Resolved files of a local model
#[derive(Debug, Clone, PartialEq)]
pub struct ModelFiles {
    /// ONNX graph
    pub model_file: PathBuf,
    /// Preprocessing read from the model directory, if any
    pub preprocessing: Option<PreprocessingConfig>,
}

impl ModelFiles {
    /// Resolve a model file or directory
    ///
    /// # Errors
    /// - Path does not exist
    /// - Directory contains no known model file
    /// - `preprocessor_config.json` exists but cannot be parsed
    pub fn resolve<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if path.is_file() {
            return Ok(Self {
                model_file: path.to_path_buf(),
                preprocessing: None,
            });
        }

        if !path.is_dir() {
            return Err(BgRemovalError::model(format!(
                "Model path not found: {}",
                path.display()
            )));
        }

        let model_file = MODEL_FILE_CANDIDATES
            .iter()
            .map(|candidate| path.join(candidate))
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| {
                BgRemovalError::model(format!(
                    "No model file found in {}. Expected one of: {}",
                    path.display(),
                    MODEL_FILE_CANDIDATES.join(", ")
                ))
            })?;

        let preprocessor_path = path.join(PREPROCESSOR_CONFIG_FILE);
        let preprocessing = if preprocessor_path.is_file() {
            Some(Self::read_preprocessor(&preprocessor_path)?)
        } else {
            None
        };

        Ok(Self {
            model_file,
            preprocessing,
        })
    }

    fn read_preprocessor(path: &Path) -> Result<PreprocessingConfig> {
        let content = fs::read_to_string(path).map_err(|e| {
            BgRemovalError::model(format!("Failed to read {}: {e}", path.display()))
        })?;
        let preprocessor: HuggingFacePreprocessor = serde_json::from_str(&content)
            .map_err(|e| {
                BgRemovalError::invalid_config(format!(
                    "Failed to parse {}: {e}",
                    path.display()
                ))
            })?;
        preprocessor.into_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_preprocessing_is_valid() {
        assert!(PreprocessingConfig::default().validate().is_ok());

        let invalid = PreprocessingConfig {
            target_size: 0,
            ..PreprocessingConfig::default()
        };
        assert!(invalid.validate().is_err());

        let invalid = PreprocessingConfig {
            normalization_std: [1.0, 0.0, 1.0],
            ..PreprocessingConfig::default()
        };
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_resolve_single_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("isnet.onnx");
        fs::write(&file, b"onnx").unwrap();

        let files = ModelFiles::resolve(&file).unwrap();
        assert_eq!(files.model_file, file);
        assert!(files.preprocessing.is_none());
    }

    #[test]
    fn test_resolve_huggingface_directory() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("onnx")).unwrap();
        fs::write(dir.path().join("onnx/model.onnx"), b"onnx").unwrap();
        fs::write(
            dir.path().join("preprocessor_config.json"),
            r#"{
                "size": {"height": 320, "width": 320},
                "image_mean": [127.5, 127.5, 127.5],
                "image_std": [255.0, 255.0, 255.0]
            }"#,
        )
        .unwrap();

        let files = ModelFiles::resolve(dir.path()).unwrap();
        assert_eq!(files.model_file, dir.path().join("onnx/model.onnx"));

        let preprocessing = files.preprocessing.unwrap();
        assert_eq!(preprocessing.target_size, 320);
        assert!((preprocessing.normalization_mean[0] - 0.5).abs() < 1e-6);
        assert!((preprocessing.normalization_std[2] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_resolve_rejects_non_square_input() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("model.onnx"), b"onnx").unwrap();
        fs::write(
            dir.path().join("preprocessor_config.json"),
            r#"{"size": {"height": 320, "width": 640}, "image_mean": [0, 0, 0], "image_std": [1, 1, 1]}"#,
        )
        .unwrap();

        let err = ModelFiles::resolve(dir.path()).unwrap_err();
        assert!(err.to_string().contains("square"));
    }

    #[test]
    fn test_resolve_missing_paths() {
        let dir = TempDir::new().unwrap();
        assert!(ModelFiles::resolve(dir.path().join("missing.onnx")).is_err());

        // Empty directory has no model file
        let err = ModelFiles::resolve(dir.path()).unwrap_err();
        assert!(err.to_string().contains("No model file found"));
    }
}
