//! HTTP server startup logic.

use std::net::SocketAddr;

use axum::Router;
use axum_server::Handle;

use crate::config::HttpServerConfig;

use super::shutdown;

/// Server startup error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid listen address '{0}'")]
    Address(String),

    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),
}

/// Resolve `host:port`, accepting both IP literals and hostnames.
async fn resolve(config: &HttpServerConfig) -> Result<SocketAddr, ServerError> {
    let target = || format!("{}:{}", config.host, config.port);
    let addr = tokio::net::lookup_host((config.host.as_str(), config.port))
        .await
        .map_err(|_| ServerError::Address(target()))?
        .next();
    addr.ok_or_else(|| ServerError::Address(target()))
}

/// Start the HTTP server.
///
/// This function blocks until the server shuts down. A listener that cannot be
/// bound is returned as `ServerError::Bind`.
pub async fn start_server(app: Router, config: &HttpServerConfig) -> Result<(), ServerError> {
    let addr = resolve(config).await?;
    let handle = Handle::new();

    tracing::info!(%addr, "Starting HTTP server");

    // Setup graceful shutdown
    shutdown::setup_shutdown_handler(handle.clone());

    axum_server::bind(addr)
        .handle(handle)
        .serve(app.into_make_service())
        .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}
