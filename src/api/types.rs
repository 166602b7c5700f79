//! API request and response types.

use serde::{Deserialize, Serialize};

use crate::provider::BackgroundRemoval;

/// Service name reported by the health probe
pub const SERVICE_NAME: &str = "withoutbg-api";

/// Health check response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always "healthy" while the process answers
    pub status: String,
    /// Crate version
    pub version: String,
    /// Service identifier
    pub service: String,
    /// Whether the local model finished loading
    pub models_loaded: bool,
}

impl HealthResponse {
    #[must_use]
    pub fn new(models_loaded: bool) -> Self {
        Self {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            service: SERVICE_NAME.to_string(),
            models_loaded,
        }
    }
}

/// Error response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable message
    pub detail: String,
}

/// Query string of `GET /api/usage`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsageQuery {
    pub api_key: Option<String>,
}

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Provider facade
    pub removal: BackgroundRemoval,
}

impl AppState {
    #[must_use]
    pub fn new(removal: BackgroundRemoval) -> Self {
        Self { removal }
    }
}
