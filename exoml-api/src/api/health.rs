//! Health check endpoint
//!
//! Never triggers an artifact load: the readiness flags describe what the
//! store already holds.

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub module: &'static str,
    pub version: &'static str,
    pub uptime_seconds: i64,
    pub model_loaded: bool,
    pub scaler_loaded: bool,
    pub metadata_loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let readiness = state.pipeline.readiness();

    Json(HealthResponse {
        status: "healthy",
        module: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: (Utc::now() - state.startup_time).num_seconds(),
        model_loaded: readiness.model_loaded,
        scaler_loaded: readiness.scaler_loaded,
        metadata_loaded: readiness.metadata_loaded,
        last_error: state.last_error().await,
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
