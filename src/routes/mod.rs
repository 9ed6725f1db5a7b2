//! HTTP route handlers and router assembly.
//!
//! The `/api` routes sit behind the CORS allow-list; the liveness routes do
//! not. Every response is marked `no-store`, unknown paths get a JSON 404, a
//! known path called with the wrong method gets a JSON 405, and a panic inside
//! any handler is turned into a JSON 500 instead of dropping the connection.
//!
//! Request tracing is enabled via middleware that generates a unique request ID
//! for each incoming request, allowing correlation of all logs within a request.

pub mod health;
pub mod story;

use std::any::Any;

use axum::{
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use http::header::{HeaderValue, CACHE_CONTROL};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::{ConfigError, CACHE_CONTROL_NO_STORE};
use crate::error::AppError;
use crate::http::cors::cors_layer;
use crate::middleware::request_id_layer;
use crate::state::AppState;

/// Fallback for unknown paths
async fn not_found() -> AppError {
    AppError::NotFound
}

/// Fallback for known paths called with an unsupported method
async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

/// Convert a handler panic into the uniform error response
fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    tracing::error!(panic = %detail, "Handler panicked");
    AppError::Internal("unexpected server fault".to_string()).into_response()
}

/// Creates the Axum router with all routes and layers.
pub fn create_router(state: AppState) -> Result<Router, ConfigError> {
    let cors = cors_layer(state.config.cors.patterns()?);

    // API routes - browser access limited to the configured origins
    let api_routes = Router::new()
        .route("/api/user-story", post(story::generate))
        // Set before the CORS layer so preflight requests still reach it
        .method_not_allowed_fallback(method_not_allowed)
        .layer(cors);

    // Liveness routes - open to any caller
    let health_routes = Router::new()
        .route("/", get(health::health))
        .route("/test", get(health::test))
        .method_not_allowed_fallback(method_not_allowed);

    Ok(Router::new()
        .merge(api_routes)
        .merge(health_routes)
        .fallback(not_found)
        .with_state(state)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static(CACHE_CONTROL_NO_STORE),
        ))
        // Request ID middleware - creates root span with request_id for correlation
        .layer(middleware::from_fn(request_id_layer)))
}
