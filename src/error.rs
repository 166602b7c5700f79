//! Error types for background removal operations

use thiserror::Error;

/// Result type alias for background removal operations
pub type Result<T> = std::result::Result<T, BgRemovalError>;

/// Error types shared by the codec, the providers and the HTTP layer
#[derive(Error, Debug)]
pub enum BgRemovalError {
    /// Input/output errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The uploaded buffer is not a readable image container
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// The processed image could not be written in the requested format
    #[error("Failed to encode image: {0}")]
    Encode(String),

    /// The local model was requested before startup finished loading it
    #[error("Models not loaded. Server may still be starting up.")]
    ModelUnavailable,

    /// Model loading or initialization errors
    #[error("Model error: {0}")]
    Model(String),

    /// Backend inference errors
    #[error("Inference error: {0}")]
    Inference(String),

    /// The remote API answered with a non-success status
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code returned by the remote API
        status: u16,
        /// Human-readable reason
        message: String,
    },

    /// Transport-level failure talking to the remote API
    #[error("Network error: {0}")]
    Network(String),

    /// A provider failed while removing a background
    #[error("{provider} provider failed: {message}")]
    Provider {
        /// Which provider raised the failure
        provider: &'static str,
        /// The provider's own message
        message: String,
    },

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Generic error for unexpected conditions
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BgRemovalError {
    /// Create a new decode error
    pub fn decode<S: Into<String>>(msg: S) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a new encode error
    pub fn encode<S: Into<String>>(msg: S) -> Self {
        Self::Encode(msg.into())
    }

    /// Create a new model error
    pub fn model<S: Into<String>>(msg: S) -> Self {
        Self::Model(msg.into())
    }

    /// Create a new inference error
    pub fn inference<S: Into<String>>(msg: S) -> Self {
        Self::Inference(msg.into())
    }

    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Create a remote API error from a status code
    pub fn api<S: Into<String>>(status: u16, message: S) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a network error with operation context
    pub fn network_error(operation: &str, error: &dyn std::fmt::Display) -> Self {
        Self::Network(format!("{operation}: {error}"))
    }

    /// Create configuration error with valid ranges
    pub fn config_value_error<T: std::fmt::Display>(
        parameter: &str,
        value: T,
        valid_range: &str,
    ) -> Self {
        Self::InvalidConfig(format!(
            "Invalid {parameter}: {value} (valid range: {valid_range})"
        ))
    }

    /// Wrap a failure raised while a provider was running.
    ///
    /// `ModelUnavailable` and already-wrapped provider errors are returned unchanged.
    #[must_use]
    pub fn into_provider_error(self, provider: &'static str) -> Self {
        match self {
            Self::ModelUnavailable | Self::Provider { .. } => self,
            Self::Api { message, .. } => Self::Provider { provider, message },
            other => Self::Provider {
                provider,
                message: other.to_string(),
            },
        }
    }
}
