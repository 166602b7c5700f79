//! Configuration conversion utilities for CLI arguments

use crate::cli::main_impl::Cli;
use crate::config::{CorsPolicy, ServerConfig};
use anyhow::{Context, Result};
use std::time::Duration;

/// Convert CLI arguments to a validated `ServerConfig`
pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    pub(crate) fn from_cli(cli: &Cli) -> Result<ServerConfig> {
        let max_upload_bytes = cli
            .max_upload_mb
            .checked_mul(1024 * 1024)
            .context("--max-upload-mb is too large")?;

        let mut builder = ServerConfig::builder()
            .host(cli.host.clone())
            .port(cli.port)
            .cors(CorsPolicy::from_origins(cli.cors_origins.iter().cloned()))
            .max_upload_bytes(max_upload_bytes)
            .studio_base_url(cli.api_url.clone())
            .studio_timeout(cli.api_timeout_secs.map(Duration::from_secs));

        if let Some(model) = &cli.model {
            builder = builder.model_path(model.clone());
        }

        Ok(builder.build()?)
    }
}
