//! Background Removal API server
//!
//! Command-line entry point: parses flags and environment, installs tracing
//! and runs the HTTP service until shutdown.

use super::config::CliConfigBuilder;
use crate::tracing_config::{TracingConfig, TracingFormat};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

/// Background removal HTTP service
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "withoutbg-server")]
pub struct Cli {
    /// Interface to bind (IP literal)
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = crate::config::DEFAULT_PORT)]
    pub port: u16,

    /// Local model: an ONNX file or a model directory
    #[arg(short, long, env = "WITHOUTBG_MODEL_PATH", value_name = "PATH")]
    pub model: Option<std::path::PathBuf>,

    /// Studio API base URL
    #[arg(long, env = "WITHOUTBG_API_URL", default_value = crate::config::DEFAULT_STUDIO_URL)]
    pub api_url: String,

    /// Studio API request timeout in seconds [default: no timeout]
    #[arg(long, value_name = "SECONDS")]
    pub api_timeout_secs: Option<u64>,

    /// Allowed CORS origin (repeatable). Any origin when omitted.
    #[arg(long = "cors-origin", env = "WITHOUTBG_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Vec<String>,

    /// Maximum upload size in MiB
    #[arg(long, default_value_t = 50)]
    pub max_upload_mb: usize,

    /// Log output format
    #[arg(long, value_enum, default_value_t = CliLogFormat::Console)]
    pub log_format: CliLogFormat,

    /// Enable verbose logging (-v: DEBUG, -vv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliLogFormat {
    Console,
    Compact,
    #[cfg(feature = "tracing-json")]
    Json,
}

impl From<CliLogFormat> for TracingFormat {
    fn from(format: CliLogFormat) -> Self {
        match format {
            CliLogFormat::Console => Self::Console,
            CliLogFormat::Compact => Self::Compact,
            #[cfg(feature = "tracing-json")]
            CliLogFormat::Json => Self::Json,
        }
    }
}

pub async fn main() -> Result<()> {
    let cli = Cli::parse();

    TracingConfig::new()
        .with_verbosity(cli.verbose)
        .with_format(cli.log_format.into())
        .with_env_filter_from_env()
        .init()
        .context("Failed to initialize tracing subscriber")?;

    let config = CliConfigBuilder::from_cli(&cli).context("Invalid configuration")?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        model = ?config.local_model.model_path,
        "Starting background removal API"
    );

    crate::api::serve(config).await.context("Server error")
}
