//! Configuration types for the background removal service

use crate::error::{BgRemovalError, Result};
use crate::models::PreprocessingConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Quality used for lossy formats when the caller does not supply one
pub const DEFAULT_QUALITY: u8 = 95;

/// Default listening port
pub const DEFAULT_PORT: u16 = 8000;

/// Default base URL of the remote Studio API
pub const DEFAULT_STUDIO_URL: &str = "https://api.withoutbg.com";

/// Output image format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// PNG with alpha channel transparency
    Png,
    /// JPEG (no transparency, alpha flattened onto white)
    Jpeg,
    /// WebP with alpha channel transparency
    WebP,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Png
    }
}

impl OutputFormat {
    /// Resolve a caller-supplied format string.
    ///
    /// Matching is case-insensitive. Anything that is not `jpg`, `jpeg` or `webp`
    /// resolves to PNG without an error.
    #[must_use]
    pub fn from_request(format: &str) -> Self {
        match format.trim().to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Self::Jpeg,
            "webp" => Self::WebP,
            _ => Self::Png,
        }
    }

    /// Whether `format` names one of the supported formats
    #[must_use]
    pub fn is_recognized(format: &str) -> bool {
        matches!(
            format.trim().to_ascii_lowercase().as_str(),
            "png" | "jpg" | "jpeg" | "webp"
        )
    }

    /// MIME type of the encoded bytes
    #[must_use]
    pub fn media_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Png => write!(f, "png"),
            Self::Jpeg => write!(f, "jpeg"),
            Self::WebP => write!(f, "webp"),
        }
    }
}

/// Clamp a caller-supplied quality into the encoder range `1..=100`
#[must_use]
pub fn clamp_quality(quality: i64) -> u8 {
    quality.clamp(1, 100) as u8
}

/// Where the local model is loaded from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalModelConfig {
    /// ONNX file, or a model directory (`model.onnx` / `onnx/model.onnx`)
    pub model_path: Option<PathBuf>,
    /// Overrides the preprocessing read from the model directory
    pub preprocessing: Option<PreprocessingConfig>,
}

/// Remote Studio API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudioApiConfig {
    /// Base URL without trailing slash
    pub base_url: String,
    /// Per-request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for StudioApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_STUDIO_URL.to_string(),
            timeout: None,
        }
    }
}

/// Cross-origin policy applied to every route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorsPolicy {
    /// Any origin, method and header
    Any,
    /// Only the listed origins, with credentials allowed
    Origins(Vec<String>),
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self::Any
    }
}

impl CorsPolicy {
    /// Build a policy from a list of origins; an empty list or `*` means any
    #[must_use]
    pub fn from_origins<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let origins: Vec<String> = origins
            .into_iter()
            .map(Into::into)
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        if origins.is_empty() || origins.iter().any(|origin| origin == "*") {
            Self::Any
        } else {
            Self::Origins(origins)
        }
    }
}

/// Configuration for the HTTP service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,
    /// Port to bind
    pub port: u16,
    /// Cross-origin policy
    pub cors: CorsPolicy,
    /// Maximum accepted request body size in bytes
    pub max_upload_bytes: usize,
    /// Local model settings
    pub local_model: LocalModelConfig,
    /// Remote API settings
    pub studio: StudioApiConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            cors: CorsPolicy::default(),
            max_upload_bytes: 50 * 1024 * 1024,
            local_model: LocalModelConfig::default(),
            studio: StudioApiConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Create a new server configuration builder
    #[must_use]
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::new()
    }

    /// Socket address to bind
    ///
    /// # Errors
    /// - Host and port do not form a valid socket address
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| {
                BgRemovalError::invalid_config(format!(
                    "Invalid listen address {}:{}: {e}",
                    self.host, self.port
                ))
            })
    }

    /// Validate the configuration
    ///
    /// # Errors
    /// - Zero upload limit
    /// - Unparseable listen address
    /// - Empty remote API base URL
    pub fn validate(&self) -> Result<()> {
        if self.max_upload_bytes == 0 {
            return Err(BgRemovalError::config_value_error(
                "max_upload_bytes",
                self.max_upload_bytes,
                "> 0",
            ));
        }
        if self.studio.base_url.trim().is_empty() {
            return Err(BgRemovalError::invalid_config(
                "Studio API base URL must not be empty",
            ));
        }
        if let Some(preprocessing) = &self.local_model.preprocessing {
            preprocessing.validate()?;
        }
        self.socket_addr()?;
        Ok(())
    }
}

/// Builder for `ServerConfig`
#[derive(Debug, Default)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.config.host = host.into();
        self
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    #[must_use]
    pub fn cors(mut self, cors: CorsPolicy) -> Self {
        self.config.cors = cors;
        self
    }

    #[must_use]
    pub fn max_upload_bytes(mut self, bytes: usize) -> Self {
        self.config.max_upload_bytes = bytes;
        self
    }

    #[must_use]
    pub fn model_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config.local_model.model_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn preprocessing(mut self, preprocessing: PreprocessingConfig) -> Self {
        self.config.local_model.preprocessing = Some(preprocessing);
        self
    }

    #[must_use]
    pub fn studio_base_url<S: Into<String>>(mut self, url: S) -> Self {
        self.config.studio.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn studio_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.studio.timeout = timeout;
        self
    }

    /// Build the server configuration
    ///
    /// # Errors
    /// - Any check performed by [`ServerConfig::validate`]
    pub fn build(self) -> Result<ServerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
