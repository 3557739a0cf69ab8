//! API module for Stash serve crate

use crate::handlers::{handle_health_check, handle_items_cached, handle_items_slow, AppState};
use axum::{response::IntoResponse, response::Json, routing::get, Router};
use serde::{Deserialize, Serialize};

/// API version
pub const API_VERSION: &str = "v1";

/// API routes configuration
pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handle_health_check))
        .route("/version", get(get_version))
        .route("/items/slow", get(handle_items_slow))
        .route("/items/cached", get(handle_items_cached))
}

/// Get version information
pub async fn get_version() -> impl IntoResponse {
    Json(VersionResponse {
        version: crate::VERSION.to_string(),
        api_version: API_VERSION.to_string(),
        build_info: BuildInfo {
            commit: option_env!("VERGEN_GIT_SHA")
                .unwrap_or("unknown")
                .to_string(),
            build_date: option_env!("VERGEN_BUILD_TIMESTAMP")
                .unwrap_or("unknown")
                .to_string(),
        },
    })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VersionResponse {
    pub version: String,
    pub api_version: String,
    pub build_info: BuildInfo,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BuildInfo {
    pub commit: String,
    pub build_date: String,
}
