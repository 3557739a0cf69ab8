//! Read-through retrieval service
//!
//! [`RetrievalService::retrieve_cached`] runs the cache-aside protocol:
//! lookup, then on a miss fetch from the source, populate the cache and
//! respond. [`RetrievalService::retrieve_uncached`] always fetches, giving
//! the baseline the cache is measured against. Both share
//! `fetch_from_source` so their timings are comparable.
//!
//! There is no in-process lock. Concurrent misses may each fetch and
//! populate; the last write wins.

use crate::cache::CacheStore;
use crate::config::StashConfig;
use crate::error::Result;
use crate::source::ItemSource;
use crate::types::{
    ItemCollection, Provenance, RetrievalResult, DEFAULT_TTL_SECONDS, ITEMS_CACHE_KEY,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Settings for a [`RetrievalService`]
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalSettings {
    /// Key under which the whole collection is cached
    pub cache_key: String,
    /// Lifetime of a populated entry
    pub ttl_seconds: u64,
    /// Artificial delay before every source fetch
    pub fetch_delay: Duration,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            cache_key: ITEMS_CACHE_KEY.to_string(),
            ttl_seconds: DEFAULT_TTL_SECONDS,
            fetch_delay: Duration::from_millis(800),
        }
    }
}

impl RetrievalSettings {
    pub fn from_config(config: &StashConfig) -> Self {
        Self {
            cache_key: config.cache.key.clone(),
            ttl_seconds: config.cache.ttl_seconds,
            fetch_delay: Duration::from_millis(config.retrieval.fetch_delay_ms),
        }
    }

    /// Same settings without the artificial delay
    pub fn without_delay(mut self) -> Self {
        self.fetch_delay = Duration::ZERO;
        self
    }
}

/// Cache-aside retrieval of the item collection
#[derive(Clone)]
pub struct RetrievalService {
    cache: Arc<dyn CacheStore>,
    source: Arc<dyn ItemSource>,
    settings: RetrievalSettings,
}

impl RetrievalService {
    pub fn new(
        cache: Arc<dyn CacheStore>,
        source: Arc<dyn ItemSource>,
        settings: RetrievalSettings,
    ) -> Self {
        Self {
            cache,
            source,
            settings,
        }
    }

    /// Serve the collection from the cache, falling back to the source
    ///
    /// # Errors
    ///
    /// A failed lookup, a corrupt cache entry or a failed source fetch fails
    /// the request. A failed populate does not.
    pub async fn retrieve_cached(&self) -> Result<RetrievalResult> {
        let started = Instant::now();
        let key = self.settings.cache_key.as_str();

        // An empty string is treated like a missing entry
        if let Some(cached) = self.cache.get(key).await?.filter(|v| !v.is_empty()) {
            let items = ItemCollection::from_cache_value(&cached)?;
            debug!(key, items = items.len(), backend = self.cache.name(), "Cache hit");
            return Ok(RetrievalResult::new(
                Provenance::Cache,
                started.elapsed(),
                items,
            ));
        }

        debug!(key, backend = self.cache.name(), "Cache miss");

        let items = self.fetch_from_source().await?;
        self.populate(key, &items).await;

        Ok(RetrievalResult::new(
            Provenance::SourceThenCached,
            started.elapsed(),
            items,
        ))
    }

    /// Fetch straight from the source without touching the cache
    pub async fn retrieve_uncached(&self) -> Result<RetrievalResult> {
        let started = Instant::now();
        let items = self.fetch_from_source().await?;

        Ok(RetrievalResult::new(
            Provenance::Source,
            started.elapsed(),
            items,
        ))
    }

    async fn fetch_from_source(&self) -> Result<ItemCollection> {
        if !self.settings.fetch_delay.is_zero() {
            tokio::time::sleep(self.settings.fetch_delay).await;
        }

        let items = self.source.fetch_items().await?;
        debug!(
            items = items.len(),
            source = self.source.name(),
            "Fetched items from source"
        );
        Ok(items)
    }

    async fn populate(&self, key: &str, items: &ItemCollection) {
        let value = match items.to_cache_value() {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Failed to serialize items for cache");
                return;
            }
        };

        match self.cache.set(key, &value, self.settings.ttl_seconds).await {
            Ok(()) => info!(
                key,
                ttl_seconds = self.settings.ttl_seconds,
                items = items.len(),
                "Populated cache"
            ),
            Err(e) => warn!(key, error = %e, "Failed to populate cache, serving source data"),
        }
    }
}
