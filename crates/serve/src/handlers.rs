//! HTTP handlers for Stash serve crate

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use stash_core::{Item, Provenance, Result, RetrievalResult, RetrievalService, StashError};
use std::sync::Arc;

/// Message returned for every failed retrieval
pub const RETRIEVAL_FAILED: &str = "Failed to retrieve items";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<RetrievalService>,
}

impl AppState {
    /// Create application state around a connected retrieval service
    pub fn new(service: RetrievalService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

/// Handler for the uncached baseline: always reads the source
pub async fn handle_items_slow(State(state): State<AppState>) -> Response {
    respond(state.service.retrieve_uncached().await, "/items/slow")
}

/// Handler for the read-through path
pub async fn handle_items_cached(State(state): State<AppState>) -> Response {
    respond(state.service.retrieve_cached().await, "/items/cached")
}

fn respond(result: Result<RetrievalResult>, route: &str) -> Response {
    match result {
        Ok(result) => {
            tracing::info!(
                route,
                source = %result.provenance,
                elapsed_ms = result.elapsed_ms(),
                items = result.items.len(),
                "Served items"
            );
            (StatusCode::OK, Json(ItemsResponse::from(result))).into_response()
        }
        Err(e) => retrieval_error(route, e),
    }
}

/// Every failure looks the same to the client; the cause is only logged
fn retrieval_error(route: &str, error: StashError) -> Response {
    tracing::error!(
        route,
        category = %error.category(),
        "Retrieval failed: {}",
        error
    );

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: RETRIEVAL_FAILED.to_string(),
        }),
    )
        .into_response()
}

/// Handler for server health check
pub async fn handle_health_check() -> impl IntoResponse {
    Json(HealthCheckResponse {
        ok: true,
        version: crate::VERSION.to_string(),
        timestamp: chrono::Utc::now(),
    })
}

// Response types

/// Body of both items endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ItemsResponse {
    /// Which path served the request
    pub source: Provenance,
    /// Milliseconds from request start to response, 2 decimal places
    pub elapsed_ms: f64,
    /// Items in ascending id order
    pub items: Vec<Item>,
}

impl From<RetrievalResult> for ItemsResponse {
    fn from(result: RetrievalResult) -> Self {
        Self {
            source: result.provenance,
            elapsed_ms: result.elapsed_ms(),
            items: result.items.into_items(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    pub ok: bool,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use stash_core::ItemCollection;
    use std::time::Duration;

    #[test]
    fn test_items_response_serialization() {
        let result = RetrievalResult::new(
            Provenance::SourceThenCached,
            Duration::from_micros(801_456),
            ItemCollection::new(vec![Item::new(2, "b"), Item::new(1, "a")]),
        );

        let json = serde_json::to_value(ItemsResponse::from(result)).unwrap();
        assert_eq!(json["source"], "source_then_cached");
        assert_eq!(json["elapsed_ms"], 801.46);
        assert_eq!(
            json["items"],
            serde_json::json!([{"id": 1, "name": "a"}, {"id": 2, "name": "b"}])
        );
    }

    #[test]
    fn test_error_response_hides_cause() {
        let response = retrieval_error("/items/cached", StashError::cache("redis down"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_health_check_handler() {
        let response = handle_health_check().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
