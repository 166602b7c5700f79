//! Studio API client against an in-process mock server

use axum::{
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bgremove_api::{
    config::StudioApiConfig,
    error::BgRemovalError,
    provider::{BackgroundRemover, RemoteProvider},
    services::ImageIOService,
    OutputFormat, StudioApi,
};
use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use serde_json::json;

fn api_key(headers: &HeaderMap) -> &str {
    headers
        .get("X-API-Key")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

fn error_for(key: &str) -> Option<Response> {
    match key {
        "valid" => None,
        "broke" => Some(StatusCode::PAYMENT_REQUIRED.into_response()),
        "busy" => Some(StatusCode::TOO_MANY_REQUESTS.into_response()),
        "flaky" => Some((StatusCode::BAD_GATEWAY, "upstream exploded").into_response()),
        _ => Some(StatusCode::UNAUTHORIZED.into_response()),
    }
}

/// Returns a half-resolution alpha of constant 200
async fn alpha(headers: HeaderMap, Json(body): Json<serde_json::Value>) -> Response {
    if let Some(response) = error_for(api_key(&headers)) {
        return response;
    }

    let uploaded = body["image_base64"].as_str().unwrap_or_default();
    let Ok(bytes) = STANDARD.decode(uploaded) else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    let Ok(image) = ImageIOService::decode(&bytes) else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    let matte = DynamicImage::ImageLuma8(GrayImage::from_pixel(
        image.width() / 2,
        image.height() / 2,
        Luma([200]),
    ));
    let mut png = Vec::new();
    matte
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();

    Json(json!({ "alpha_base64": STANDARD.encode(png) })).into_response()
}

async fn credit(headers: HeaderMap) -> Response {
    if let Some(response) = error_for(api_key(&headers)) {
        return response;
    }
    Json(json!({ "credit": 37, "expires": null })).into_response()
}

async fn spawn_mock() -> StudioApiConfig {
    let app = Router::new()
        .route("/v1.0/alpha-channel-base64", post(alpha))
        .route("/available-credit", get(credit));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    StudioApiConfig {
        base_url: format!("http://{addr}"),
        timeout: Some(std::time::Duration::from_secs(10)),
    }
}

fn sample() -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(20, 10, Rgb([250, 20, 20])))
}

fn api_status(err: &BgRemovalError) -> Option<(u16, String)> {
    match err {
        BgRemovalError::Api { status, message } => Some((*status, message.clone())),
        _ => None,
    }
}

#[tokio::test]
async fn alpha_is_resized_and_applied() {
    let config = spawn_mock().await;
    let api = StudioApi::new("valid", &config).unwrap();

    let processed = api.remove_background(sample()).await.unwrap();
    assert_eq!(processed.dimensions(), (20, 10));
    for pixel in processed.as_rgba().pixels() {
        assert_eq!(pixel.0[..3], [250, 20, 20]);
        assert!((199..=201).contains(&pixel.0[3]), "{pixel:?}");
    }

    // The result still encodes like any other processed image
    let png = ImageIOService::encode(&processed.into_dynamic(), OutputFormat::Png, 95).unwrap();
    assert!(!png.bytes.is_empty());
}

#[tokio::test]
async fn usage_is_returned_unmodified() {
    let config = spawn_mock().await;
    let api = StudioApi::new("valid", &config).unwrap();

    let usage = api.get_usage().await.unwrap();
    assert_eq!(usage, json!({ "credit": 37, "expires": null }));
}

#[tokio::test]
async fn error_statuses_are_mapped() {
    let config = spawn_mock().await;

    let cases = [
        ("nope", 401, "Invalid API key"),
        ("broke", 402, "Insufficient credits"),
        ("busy", 429, "Rate limit exceeded"),
        (
            "flaky",
            502,
            "API request failed with status 502: upstream exploded",
        ),
    ];

    for (key, status, message) in cases {
        let api = StudioApi::new(key, &config).unwrap();

        let err = api.remove_background(sample()).await.unwrap_err();
        assert_eq!(api_status(&err), Some((status, message.to_string())), "key {key}");

        let err = api.get_usage().await.unwrap_err();
        assert_eq!(api_status(&err), Some((status, message.to_string())), "key {key}");
    }
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    // Bind then drop to get a port with nothing listening
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = StudioApiConfig {
        base_url: format!("http://{addr}"),
        timeout: Some(std::time::Duration::from_secs(5)),
    };
    let api = StudioApi::new("valid", &config).unwrap();

    let err = api.get_usage().await.unwrap_err();
    assert!(matches!(err, BgRemovalError::Network(_)), "{err:?}");
}
