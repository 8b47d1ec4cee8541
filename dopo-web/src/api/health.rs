//! Health check endpoint

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

/// Identity stamped in by `build.rs`
#[derive(Debug, Serialize)]
pub struct BuildInfo {
    pub commit: &'static str,
    pub built: &'static str,
    pub profile: &'static str,
}

impl BuildInfo {
    pub const CURRENT: BuildInfo = BuildInfo {
        commit: env!("GIT_HASH"),
        built: env!("BUILD_TIMESTAMP"),
        profile: env!("BUILD_PROFILE"),
    };
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub module: &'static str,
    pub version: &'static str,
    pub build: BuildInfo,
}

/// GET /health
///
/// Answers without contacting any upstream service.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        module: "dopo-web",
        version: env!("CARGO_PKG_VERSION"),
        build: BuildInfo::CURRENT,
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
