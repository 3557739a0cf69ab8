//! Integration tests for the items endpoints
//!
//! The router is exercised in-process through `axum-test`, with the cache
//! store and item source replaced by the fakes from `stash-core`.

use axum::http::StatusCode;
use axum_test::TestServer;
use stash_core::testing::{FakeCacheStore, StaticItemSource};
use stash_core::{Item, Provenance, RetrievalService, RetrievalSettings, ITEMS_CACHE_KEY};
use stash_serve::{ErrorResponse, ItemsResponse, ServerBuilder};
use std::sync::Arc;
use std::time::Duration;

struct Harness {
    server: TestServer,
    cache: Arc<FakeCacheStore>,
    source: Arc<StaticItemSource>,
}

fn harness(settings: RetrievalSettings) -> Harness {
    let cache = Arc::new(FakeCacheStore::new());
    let source = Arc::new(StaticItemSource::new(vec![
        Item::new(2, "b"),
        Item::new(1, "a"),
    ]));
    let service = RetrievalService::new(cache.clone(), source.clone(), settings);

    let app = ServerBuilder::new().build(service).router();

    Harness {
        server: TestServer::new(app).unwrap(),
        cache,
        source,
    }
}

fn fast_settings() -> RetrievalSettings {
    RetrievalSettings::default().without_delay()
}

fn expected_items() -> Vec<Item> {
    vec![Item::new(1, "a"), Item::new(2, "b")]
}

#[tokio::test]
async fn test_concrete_scenario_with_default_delay() {
    let h = harness(RetrievalSettings::default());

    let slow: ItemsResponse = h.server.get("/items/slow").await.json();
    assert_eq!(slow.source, Provenance::Source);
    assert_eq!(slow.items, expected_items());
    assert!(slow.elapsed_ms >= 800.0);

    let miss: ItemsResponse = h.server.get("/items/cached").await.json();
    assert_eq!(miss.source, Provenance::SourceThenCached);
    assert_eq!(miss.items, expected_items());
    assert!(miss.elapsed_ms >= 800.0);

    let hit: ItemsResponse = h.server.get("/items/cached").await.json();
    assert_eq!(hit.source, Provenance::Cache);
    assert_eq!(hit.items, expected_items());
    assert!(hit.elapsed_ms < 50.0);
    assert!(hit.elapsed_ms < slow.elapsed_ms);
    assert!(hit.elapsed_ms < miss.elapsed_ms);
}

#[tokio::test]
async fn test_wire_format() {
    let h = harness(fast_settings());

    let response = h.server.get("/items/cached").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["source"], "source_then_cached");
    assert!(body["elapsed_ms"].is_number());
    assert_eq!(
        body["items"],
        serde_json::json!([{"id": 1, "name": "a"}, {"id": 2, "name": "b"}])
    );
}

#[tokio::test]
async fn test_cached_endpoint_populates_once() {
    let h = harness(fast_settings());

    for _ in 0..4 {
        h.server.get("/items/cached").await.assert_status_ok();
    }

    assert_eq!(h.source.fetch_count(), 1);
    assert_eq!(h.cache.set_count(), 1);

    let remaining = h.cache.remaining_ttl(ITEMS_CACHE_KEY).unwrap();
    assert!(remaining > Duration::ZERO);
    assert!(remaining <= Duration::from_secs(30));
}

#[tokio::test]
async fn test_slow_endpoint_ignores_cache() {
    let h = harness(fast_settings());

    h.server.get("/items/cached").await.assert_status_ok();
    let slow: ItemsResponse = h.server.get("/items/slow").await.json();

    assert_eq!(slow.source, Provenance::Source);
    assert_eq!(h.source.fetch_count(), 2);
    assert_eq!(h.cache.get_count(), 1);
}

#[tokio::test]
async fn test_expired_entry_is_refetched() {
    let settings = RetrievalSettings {
        ttl_seconds: 1,
        ..fast_settings()
    };
    let h = harness(settings);

    let first: ItemsResponse = h.server.get("/items/cached").await.json();
    assert_eq!(first.source, Provenance::SourceThenCached);

    tokio::time::sleep(Duration::from_millis(1100)).await;

    let after_expiry: ItemsResponse = h.server.get("/items/cached").await.json();
    assert_eq!(after_expiry.source, Provenance::SourceThenCached);
    assert_eq!(h.source.fetch_count(), 2);
}

#[tokio::test]
async fn test_cache_outage_fails_request() {
    let h = harness(fast_settings());
    h.cache.fail_gets(true);

    let response = h.server.get("/items/cached").await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

    let body: ErrorResponse = response.json();
    assert_eq!(body.error, "Failed to retrieve items");
    assert_eq!(h.source.fetch_count(), 0);
}

#[tokio::test]
async fn test_source_outage_fails_both_endpoints() {
    let h = harness(fast_settings());
    h.source.fail_fetches(true);

    h.server
        .get("/items/slow")
        .await
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR);

    let response = h.server.get("/items/cached").await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorResponse = response.json();
    assert_eq!(body.error, "Failed to retrieve items");
}

#[tokio::test]
async fn test_populate_failure_still_serves_items() {
    let h = harness(fast_settings());
    h.cache.fail_sets(true);

    let response: ItemsResponse = h.server.get("/items/cached").await.json();
    assert_eq!(response.source, Provenance::SourceThenCached);
    assert_eq!(response.items, expected_items());
}

#[tokio::test]
async fn test_health_endpoint() {
    let h = harness(fast_settings());

    let response = h.server.get("/health").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["ok"], true);
    assert_eq!(body["version"], stash_serve::VERSION);
}

#[tokio::test]
async fn test_version_endpoint() {
    let h = harness(fast_settings());

    let response: stash_serve::api::VersionResponse = h.server.get("/version").await.json();
    assert_eq!(response.api_version, stash_serve::api::API_VERSION);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let h = harness(fast_settings());
    h.server
        .get("/items")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
