//! API error handling.

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

use crate::error::BgRemovalError;

use super::types::ErrorResponse;

/// Errors surfaced by the HTTP layer, each with a fixed status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// 400: the request is well-formed but not acceptable
    Validation(String),
    /// 413: the upload exceeds the configured body limit
    PayloadTooLarge(String),
    /// 422: a required field is missing or has the wrong type
    Unprocessable(String),
    /// 503: the local model is still loading
    NotReady(String),
    /// 500: a provider or remote API failure, message passed through
    Domain(String),
    /// 500: any other processing failure
    Internal(String),
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotReady(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Domain(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    #[must_use]
    pub fn detail(&self) -> &str {
        match self {
            Self::Validation(detail)
            | Self::PayloadTooLarge(detail)
            | Self::Unprocessable(detail)
            | Self::NotReady(detail)
            | Self::Domain(detail)
            | Self::Internal(detail) => detail,
        }
    }
}

impl From<BgRemovalError> for ApiError {
    fn from(error: BgRemovalError) -> Self {
        match error {
            BgRemovalError::ModelUnavailable => Self::NotReady(error.to_string()),
            // The client sees the provider's own message; the provider name stays in the logs
            BgRemovalError::Provider { provider, message } => {
                tracing::warn!(provider, error = %message, "Provider failed");
                Self::Domain(message)
            },
            BgRemovalError::Api { .. }
            | BgRemovalError::Model(_)
            | BgRemovalError::Inference(_)
            | BgRemovalError::Network(_) => Self::Domain(error.to_string()),
            BgRemovalError::Decode(_)
            | BgRemovalError::Encode(_)
            | BgRemovalError::Io(_)
            | BgRemovalError::InvalidConfig(_)
            | BgRemovalError::Internal(_) => Self::Internal(format!("Processing failed: {error}")),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(error: MultipartError) -> Self {
        if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge(error.body_text())
        } else {
            Self::Validation(error.body_text())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), detail = self.detail(), "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), detail = self.detail(), "Request rejected");
        }

        let body = Json(ErrorResponse {
            detail: self.detail().to_string(),
        });
        (status, body).into_response()
    }
}
