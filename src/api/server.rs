//! API server setup and configuration.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    config::{CorsPolicy, ServerConfig},
    error::Result,
    lifecycle::{spawn_model_loader, ModelSlot},
    provider::BackgroundRemoval,
    studio::StudioApiFactory,
};

use super::{
    handlers::{health_handler, remove_background_handler, usage_handler},
    types::AppState,
};

fn cors_layer(policy: &CorsPolicy) -> CorsLayer {
    match policy {
        CorsPolicy::Any => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        CorsPolicy::Origins(origins) => {
            let origins: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|origin| match HeaderValue::from_str(origin) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                        None
                    },
                })
                .collect();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(AllowMethods::mirror_request())
                .allow_headers(AllowHeaders::mirror_request())
                .allow_credentials(true)
        },
    }
}

/// Create the API router with all routes configured.
///
/// # Arguments
///
/// * `state` - Provider facade shared by all handlers
/// * `config` - Upload limit and CORS policy
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use bgremove_api::{
///     api::{create_router, AppState},
///     config::ServerConfig,
///     lifecycle::ModelSlot,
///     provider::BackgroundRemoval,
///     studio::StudioApiFactory,
/// };
///
/// let config = ServerConfig::default();
/// let removal = BackgroundRemoval::new(
///     Arc::new(ModelSlot::new()),
///     Arc::new(StudioApiFactory::new(config.studio.clone())),
/// );
/// let router = create_router(AppState::new(removal), &config);
/// ```
pub fn create_router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/api/remove-background", post(remove_background_handler))
        .route("/api/usage", get(usage_handler))
        .route("/api/health", get(health_handler))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors_layer(&config.cors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the API server.
///
/// The listener is bound before the local model starts loading, so the health
/// probe answers with `models_loaded: false` while initialization runs.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the address cannot be
/// bound, or the server fails while running.
pub async fn serve(config: ServerConfig) -> Result<()> {
    config.validate()?;
    let addr = config.socket_addr()?;

    let slot = Arc::new(ModelSlot::new());
    let removal = BackgroundRemoval::new(
        slot.clone(),
        Arc::new(StudioApiFactory::new(config.studio.clone())),
    );
    let app = create_router(AppState::new(removal), &config);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        studio_url = %config.studio.base_url,
        "Background removal API listening"
    );

    if config.local_model.model_path.is_some() {
        spawn_model_loader(slot, config.local_model.clone());
    } else {
        tracing::warn!("No local model configured; only requests with an API key can be served");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
