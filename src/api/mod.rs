//! HTTP API for background removal.
//!
//! An Axum server exposing the background-removal facade over HTTP.
//!
//! # Endpoints
//!
//! - `POST /api/remove-background` - Remove the background of an uploaded image (multipart form data)
//! - `GET /api/usage` - Usage record for a Studio API key
//! - `GET /api/health` - Health probe, reports whether the local model is loaded
//!
//! # Examples
//!
//! ## Starting the server
//!
//! ```no_run
//! use bgremove_api::{api::serve, config::ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> bgremove_api::Result<()> {
//!     let config = ServerConfig::builder()
//!         .model_path("models/withoutbg")
//!         .build()?;
//!     serve(config).await
//! }
//! ```
//!
//! # cURL Examples
//!
//! ```bash
//! # Local model, WebP output
//! curl -F "file=@photo.jpg" -F "format=webp" -F "quality=80" \
//!      http://localhost:8000/api/remove-background -o out.webp
//!
//! # Studio API
//! curl -F "file=@photo.jpg" -F "api_key=$WITHOUTBG_API_KEY" \
//!      http://localhost:8000/api/remove-background -o out.png
//!
//! # Usage and health
//! curl "http://localhost:8000/api/usage?api_key=$WITHOUTBG_API_KEY"
//! curl http://localhost:8000/api/health
//! ```

mod error;
mod handlers;
mod server;
mod types;

pub use error::ApiError;
pub use server::{create_router, serve};
pub use types::{AppState, ErrorResponse, HealthResponse, UsageQuery, SERVICE_NAME};
