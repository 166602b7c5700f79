//! Client for the withoutBG Studio API
//!
//! A `StudioApi` is scoped to one caller credential and is built per request;
//! nothing about a caller's key outlives the call that used it.

use crate::{
    config::{OutputFormat, StudioApiConfig},
    error::{BgRemovalError, Result},
    provider::{BackgroundRemover, RemoteProvider, RemoteProviderFactory},
    services::ImageIOService,
    types::{ProcessedImage, SegmentationMask},
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

/// Name used for the remote provider in errors and logs
pub const STUDIO_PROVIDER: &str = "studio";

/// Credential header expected by the Studio API
const API_KEY_HEADER: &str = "X-API-Key";

const ALPHA_ENDPOINT: &str = "/v1.0/alpha-channel-base64";
const USAGE_ENDPOINT: &str = "/available-credit";

#[derive(Debug, Serialize)]
struct AlphaRequest<'a> {
    image_base64: &'a str,
}

#[derive(Debug, Deserialize)]
struct AlphaResponse {
    alpha_base64: String,
}

/// Map a non-success Studio API status to an error
#[must_use]
pub fn status_error(status: u16, body: &str) -> BgRemovalError {
    let message = match status {
        401 => "Invalid API key".to_string(),
        402 => "Insufficient credits".to_string(),
        429 => "Rate limit exceeded".to_string(),
        _ => format!("API request failed with status {status}: {body}"),
    };
    BgRemovalError::api(status, message)
}

/// Studio API client bound to a single API key
pub struct StudioApi {
    client: Client,
    api_key: String,
    base_url: String,
}

impl StudioApi {
    /// Create a client for `api_key`
    ///
    /// # Errors
    /// - Empty API key
    /// - HTTP client construction failure
    pub fn new(api_key: &str, config: &StudioApiConfig) -> Result<Self> {
        if api_key.is_empty() {
            return Err(BgRemovalError::invalid_config("API key must not be empty"));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| BgRemovalError::network_error("Failed to create HTTP client", &e))?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.base_url)
    }

    /// Request the alpha matte for `image` and decode it
    ///
    /// # Errors
    /// - Transport failure or non-success status
    /// - Malformed response body
    pub async fn alpha_channel(&self, image: &DynamicImage) -> Result<SegmentationMask> {
        let encoded = ImageIOService::encode(image, OutputFormat::Png, 100)?;
        let image_base64 = STANDARD.encode(&encoded.bytes);

        let response = self
            .client
            .post(self.url(ALPHA_ENDPOINT))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&AlphaRequest {
                image_base64: &image_base64,
            })
            .send()
            .await
            .map_err(|e| BgRemovalError::network_error("Studio API request failed", &e))?;

        let response = check_status(response).await?;
        let payload: AlphaResponse = response
            .json()
            .await
            .map_err(|e| BgRemovalError::network_error("Invalid Studio API response", &e))?;

        let alpha_bytes = STANDARD
            .decode(payload.alpha_base64.as_bytes())
            .map_err(|e| BgRemovalError::decode(format!("Invalid alpha channel encoding: {e}")))?;
        let alpha = ImageIOService::decode(&alpha_bytes)?.to_luma8();
        Ok(SegmentationMask::from_image(alpha))
    }
}

impl std::fmt::Debug for StudioApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StudioApi")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = match status {
        StatusCode::UNAUTHORIZED | StatusCode::PAYMENT_REQUIRED | StatusCode::TOO_MANY_REQUESTS => {
            String::new()
        },
        _ => response.text().await.unwrap_or_default(),
    };
    tracing::warn!(status = status.as_u16(), "Studio API returned an error status");
    Err(status_error(status.as_u16(), &body))
}

#[async_trait]
impl BackgroundRemover for StudioApi {
    fn name(&self) -> &'static str {
        STUDIO_PROVIDER
    }

    async fn remove_background(&self, image: DynamicImage) -> Result<ProcessedImage> {
        let mut mask = self.alpha_channel(&image).await?;
        let (width, height) = (image.width(), image.height());
        if mask.dimensions != (width, height) {
            mask = mask.resize(width, height)?;
        }
        ProcessedImage::from_mask(&image, &mask)
    }
}

#[async_trait]
impl RemoteProvider for StudioApi {
    async fn get_usage(&self) -> Result<serde_json::Value> {
        let response = self
            .client
            .get(self.url(USAGE_ENDPOINT))
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| BgRemovalError::network_error("Studio API request failed", &e))?;

        check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| BgRemovalError::network_error("Invalid Studio API response", &e))
    }
}

/// Connects a fresh [`StudioApi`] for every caller credential
#[derive(Debug, Clone, Default)]
pub struct StudioApiFactory {
    config: StudioApiConfig,
}

impl StudioApiFactory {
    #[must_use]
    pub fn new(config: StudioApiConfig) -> Self {
        Self { config }
    }
}

impl RemoteProviderFactory for StudioApiFactory {
    fn connect(&self, api_key: &str) -> Result<Box<dyn RemoteProvider>> {
        Ok(Box::new(StudioApi::new(api_key, &self.config)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (401, "Invalid API key"),
            (402, "Insufficient credits"),
            (429, "Rate limit exceeded"),
        ];
        for (status, expected) in cases {
            match status_error(status, "ignored") {
                BgRemovalError::Api { status: s, message } => {
                    assert_eq!(s, status);
                    assert_eq!(message, expected);
                },
                other => panic!("unexpected error: {other:?}"),
            }
        }

        let err = status_error(500, "upstream exploded");
        assert_eq!(
            err.to_string(),
            "API error (500): API request failed with status 500: upstream exploded"
        );
    }

    #[test]
    fn test_empty_key_rejected() {
        let err = StudioApi::new("", &StudioApiConfig::default()).unwrap_err();
        assert!(matches!(err, BgRemovalError::InvalidConfig(_)));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let config = StudioApiConfig {
            base_url: "http://localhost:9000/".to_string(),
            timeout: None,
        };
        let api = StudioApi::new("key", &config).unwrap();
        assert_eq!(api.url(USAGE_ENDPOINT), "http://localhost:9000/available-credit");
        assert_eq!(api.name(), STUDIO_PROVIDER);
    }

    #[test]
    fn test_factory_connects_per_key() {
        let factory = StudioApiFactory::default();
        assert!(factory.connect("abc123").is_ok());
        assert!(factory.connect("").is_err());
    }
}
