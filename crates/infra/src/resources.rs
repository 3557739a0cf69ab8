//! Process-wide resources
//!
//! The Postgres pool and the cache store are created once at startup,
//! injected into the retrieval service, and torn down at shutdown.

use crate::memory_store::MemoryCacheStore;
use crate::postgres::PgItemSource;
use crate::redis_store::RedisCacheStore;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use stash_core::config::DatabaseConfig;
use stash_core::{
    CacheBackend, CacheStore, ItemSource, Result, RetrievalService, RetrievalSettings,
    StashConfig, StashError,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Connected collaborators of the retrieval service
#[derive(Clone)]
pub struct Resources {
    pool: PgPool,
    cache: Arc<dyn CacheStore>,
    settings: RetrievalSettings,
}

impl Resources {
    /// Connect to the database and the configured cache backend
    ///
    /// # Errors
    ///
    /// Returns `StashError::Source` if the database pool cannot be created
    /// and `StashError::Cache` if the cache backend cannot be reached
    pub async fn connect(config: &StashConfig) -> Result<Self> {
        let pool = connect_pool(&config.database).await?;
        let cache = connect_cache(config).await?;

        info!(
            cache = cache.name(),
            max_connections = config.database.max_connections,
            "Resources initialized"
        );

        Ok(Self {
            pool,
            cache,
            settings: RetrievalSettings::from_config(config),
        })
    }

    /// Build a retrieval service sharing these resources
    pub fn retrieval_service(&self) -> RetrievalService {
        RetrievalService::new(
            self.cache.clone(),
            Arc::new(PgItemSource::new(self.pool.clone())),
            self.settings.clone(),
        )
    }

    /// Probe the database and the cache
    pub async fn health(&self) -> HealthStatus {
        let source = PgItemSource::new(self.pool.clone());
        HealthStatus {
            database: probe(source.ping().await, "database"),
            cache: probe(self.cache.ping().await, self.cache.name()),
        }
    }

    pub fn cache(&self) -> &Arc<dyn CacheStore> {
        &self.cache
    }

    /// Close the database pool
    pub async fn close(self) {
        self.pool.close().await;
        info!("Resources closed");
    }
}

fn probe(result: Result<()>, what: &str) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("{} health check failed: {}", what, e);
            false
        }
    }
}

async fn connect_pool(config: &DatabaseConfig) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
        .test_before_acquire(true)
        .connect(&config.url)
        .await
        .map_err(|e| StashError::source(format!("Failed to connect to database: {}", e)))
}

async fn connect_cache(config: &StashConfig) -> Result<Arc<dyn CacheStore>> {
    let cache: Arc<dyn CacheStore> = match config.cache.backend {
        CacheBackend::Redis => Arc::new(RedisCacheStore::connect(&config.cache.url).await?),
        CacheBackend::Memory => Arc::new(MemoryCacheStore::new(config.cache.max_capacity)),
    };
    Ok(cache)
}

/// Health status of the collaborators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthStatus {
    pub database: bool,
    pub cache: bool,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.database && self.cache
    }
}
