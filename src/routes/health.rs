//! Liveness endpoints.
//!
//! `GET /` reports that the process is up and echoes a few configuration
//! fields for diagnostics. `GET /test` is a fixed smoke-test response.
//! Neither touches the provider.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::instrument;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub message: &'static str,
    pub timestamp: DateTime<Utc>,
    pub port: u16,
    pub environment: String,
}

#[derive(Debug, Serialize)]
pub struct TestResponse {
    pub message: &'static str,
}

/// Health check handler.
#[instrument(name = "health::health", skip_all)]
pub async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    tracing::info!("Health check endpoint called");
    Json(HealthStatus {
        status: "healthy",
        message: "AI Server is running",
        timestamp: Utc::now(),
        port: state.config.http.port,
        environment: state.config.environment.clone(),
    })
}

#[instrument(name = "health::test")]
pub async fn test() -> Json<TestResponse> {
    tracing::info!("Test endpoint called");
    Json(TestResponse {
        message: "Test endpoint working",
    })
}
