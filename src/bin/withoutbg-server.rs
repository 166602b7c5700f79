//! withoutbg background removal API server
//!
//! Serves `POST /api/remove-background`, `GET /api/usage` and `GET /api/health`
//! using a local ONNX model or the withoutBG Studio API.

use bgremove_api::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::main().await
}
