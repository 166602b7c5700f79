#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]

//! # withoutbg Background Removal API
//!
//! An HTTP service that removes image backgrounds with either a local ONNX
//! model or the remote withoutBG Studio API, chosen per request by whether
//! the caller supplied an API key.
//!
//! ## Features
//!
//! - **Two Providers**: local model (Tract, pure Rust) or the Studio API
//! - **Format Support**: PNG, JPEG and WebP output; alpha flattened onto white for JPEG
//! - **Startup Readiness**: the health probe reports whether the local model has loaded
//! - **Usage Proxy**: forwards Studio API usage queries unmodified
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bgremove_api::{api::serve, config::ServerConfig};
//!
//! # async fn example() -> bgremove_api::Result<()> {
//! let config = ServerConfig::builder()
//!     .port(8000)
//!     .model_path("models/withoutbg")
//!     .build()?;
//! serve(config).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Using the local model without HTTP
//!
//! ```rust,no_run
//! use bgremove_api::{config::LocalModelConfig, processor::OpenSourceModel, services::ImageIOService};
//!
//! # fn example() -> bgremove_api::Result<()> {
//! let model = OpenSourceModel::load(&LocalModelConfig {
//!     model_path: Some("models/withoutbg".into()),
//!     preprocessing: None,
//! })?;
//! let image = ImageIOService::decode(&std::fs::read("input.jpg")?)?;
//! let processed = model.process(&image)?;
//! let png = ImageIOService::encode(&processed.into_dynamic(), bgremove_api::OutputFormat::Png, 95)?;
//! std::fs::write("output.png", png.bytes)?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Feature Flags
//!
//! - `tract` (default): local ONNX inference
//! - `cli` (default): the `withoutbg-server` binary
//! - `tracing-json`: JSON log output

pub mod api;
pub mod backends;
pub mod config;
pub mod error;
pub mod inference;
pub mod lifecycle;
pub mod models;
pub mod processor;
pub mod provider;
pub mod services;
pub mod studio;
pub mod types;
pub mod utils;

#[cfg(feature = "cli")]
pub mod cli;
#[cfg(feature = "cli")]
pub mod tracing_config;

pub use config::{CorsPolicy, LocalModelConfig, OutputFormat, ServerConfig, StudioApiConfig};
pub use error::{BgRemovalError, Result};
pub use inference::InferenceBackend;
pub use lifecycle::ModelSlot;
pub use processor::OpenSourceModel;
pub use provider::{BackgroundRemoval, BackgroundRemover, ProviderSelection, RemoteProvider};
pub use studio::{StudioApi, StudioApiFactory};
pub use types::{ProcessedImage, SegmentationMask};
