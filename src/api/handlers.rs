//! API request handlers.

use axum::{
    body::Bytes,
    extract::{Multipart, Query, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Json, Response},
};
use tracing::instrument;

use crate::{
    config::{clamp_quality, DEFAULT_QUALITY},
    error::{BgRemovalError, Result},
    provider::ProviderSelection,
    services::ImageIOService,
};

use super::{
    error::ApiError,
    types::{AppState, HealthResponse, UsageQuery},
};

/// Fields of a `POST /api/remove-background` form
#[derive(Debug, Default)]
struct RemoveBackgroundForm {
    file: Option<Bytes>,
    content_type: Option<String>,
    format: Option<String>,
    quality: Option<String>,
    api_key: Option<String>,
}

impl RemoveBackgroundForm {
    async fn read(mut multipart: Multipart) -> std::result::Result<Self, ApiError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "file" => {
                    form.content_type = field.content_type().map(str::to_string);
                    form.file = Some(field.bytes().await?);
                },
                "format" => form.format = Some(field.text().await?),
                "quality" => form.quality = Some(field.text().await?),
                "api_key" => form.api_key = Some(field.text().await?),
                other => tracing::debug!(field = other, "Ignoring unknown form field"),
            }
        }

        Ok(form)
    }

    fn quality(&self) -> std::result::Result<u8, ApiError> {
        match self.quality.as_deref() {
            None => Ok(DEFAULT_QUALITY),
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .map(clamp_quality)
                .map_err(|_| ApiError::Unprocessable("quality: Input should be a valid integer".to_string())),
        }
    }
}

/// Run CPU-bound codec work off the async runtime
async fn blocking<T, F>(work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| BgRemovalError::internal(format!("Worker task failed: {e}")))?
}

/// Remove-background handler.
///
/// POST /api/remove-background
///
/// Accepts multipart form data with:
/// - `file`: the image (required)
/// - `format`: `png` (default), `jpg`/`jpeg` or `webp`
/// - `quality`: 1-100, default 95
/// - `api_key`: routes the request to the Studio API when non-empty
#[instrument(skip_all, fields(request_id = %uuid::Uuid::new_v4()))]
pub async fn remove_background_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> std::result::Result<Response, ApiError> {
    let form = RemoveBackgroundForm::read(multipart).await?;
    let Some(file) = form.file.clone() else {
        return Err(ApiError::Unprocessable("file: Field required".to_string()));
    };

    // Content type wins over every other field check
    let is_image = form
        .content_type
        .as_deref()
        .is_some_and(|content_type| content_type.starts_with("image/"));
    if !is_image {
        return Err(ApiError::Validation("File must be an image".to_string()));
    }

    let quality = form.quality()?;
    let format = form.format.unwrap_or_else(|| "png".to_string());
    let disposition = HeaderValue::from_str(&format!("attachment; filename=withoutbg.{format}"))
        .map_err(|_| ApiError::Validation(format!("Invalid output format: {format:?}")))?;

    let selection = ProviderSelection::from_credential(form.api_key.as_deref());
    let provider = state.removal.resolve(&selection)?;
    tracing::info!(
        provider = provider.name(),
        bytes = file.len(),
        format = %format,
        quality,
        "Processing background removal request"
    );

    let image = blocking(move || ImageIOService::decode(&file)).await?;
    let processed = provider.remove_background(image).await?;
    let encoded = blocking(move || {
        ImageIOService::encode_requested(&processed.into_dynamic(), &format, quality)
    })
    .await?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(encoded.media_type())),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        encoded.bytes,
    )
        .into_response())
}

/// Usage handler.
///
/// GET /api/usage?api_key=...
pub async fn usage_handler(
    State(state): State<AppState>,
    Query(query): Query<UsageQuery>,
) -> std::result::Result<Json<serde_json::Value>, ApiError> {
    let api_key = query
        .api_key
        .filter(|key| !key.is_empty())
        .ok_or_else(|| ApiError::Unprocessable("api_key: Field required".to_string()))?;

    state
        .removal
        .usage(&api_key)
        .await
        .map(Json)
        .map_err(|e| ApiError::Domain(format!("Failed to fetch usage: {e}")))
}

/// Health check handler.
///
/// GET /api/health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::new(state.removal.model_slot().is_ready()))
}
