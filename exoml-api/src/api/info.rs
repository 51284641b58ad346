//! Service description at `GET /`

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::models::MODEL_VERSION;
use crate::AppState;

/// Build identification captured by build.rs
#[derive(Debug, Serialize)]
pub struct BuildInfo {
    pub git_hash: &'static str,
    pub build_timestamp: &'static str,
    pub build_profile: &'static str,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            git_hash: env!("GIT_HASH"),
            build_timestamp: env!("BUILD_TIMESTAMP"),
            build_profile: env!("BUILD_PROFILE"),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Endpoints {
    pub predict: &'static str,
    pub health: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub service: &'static str,
    pub version: &'static str,
    pub model_version: &'static str,
    pub build: BuildInfo,
    pub endpoints: Endpoints,
}

/// GET /
pub async fn service_info() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: "ExoML API",
        version: env!("CARGO_PKG_VERSION"),
        model_version: MODEL_VERSION,
        build: BuildInfo::current(),
        endpoints: Endpoints {
            predict: "/api/predict (POST)",
            health: "/health (GET)",
        },
    })
}

pub fn info_routes() -> Router<AppState> {
    Router::new().route("/", get(service_info))
}
