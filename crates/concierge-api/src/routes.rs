//! Router setup with all API routes and middleware.
//!
//! Configures the axum Router with request tracing, CORS, and a body
//! size limit, then serves it with graceful shutdown.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use concierge_core::config::GeneralConfig;
use concierge_core::error::ConciergeError;

use crate::handlers;
use crate::state::AppState;

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/chat/start", post(handlers::chat_start))
        .layer(DefaultBodyLimit::max(64 * 1024)) // 64KB is plenty for SMS-sized turns
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP server on the configured address.
///
/// Serves until ctrl-c, then finishes in-flight turns before returning.
pub async fn start_server(config: &GeneralConfig, state: AppState) -> Result<(), ConciergeError> {
    let addr = format!("{}:{}", config.bind_addr, config.port);

    let router = create_router(state);

    tracing::info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ConciergeError::Api(format!("Failed to bind {}: {}", addr, e)))?;

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ConciergeError::Api(format!("Server error: {}", e)))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    } else {
        tracing::info!("Shutdown signal received");
    }
}
