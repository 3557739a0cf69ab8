//! Redis-backed cache store
//!
//! Uses a multiplexed [`ConnectionManager`] that reconnects on its own.
//! Writes use `SETEX`, so the value and its expiry are replaced in a single
//! command.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use stash_core::{CacheStore, Result, StashError};
use tracing::debug;

/// Cache store talking to a Redis server
#[derive(Clone)]
pub struct RedisCacheStore {
    connection: ConnectionManager,
}

impl RedisCacheStore {
    /// Connect to the Redis server at `url`
    ///
    /// # Errors
    ///
    /// Returns `StashError::Cache` if the URL is invalid or the server does
    /// not answer the initial connection
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| StashError::cache(format!("Invalid Redis URL {}: {}", url, e)))?;

        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| StashError::cache(format!("Failed to connect to Redis: {}", e)))?;

        debug!("Connected to Redis");
        Ok(Self { connection })
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut connection = self.connection.clone();
        let value: Option<String> = connection
            .get(key)
            .await
            .map_err(|e| StashError::cache(format!("GET {} failed: {}", key, e)))?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()> {
        let mut connection = self.connection.clone();
        let _: () = redis::cmd("SETEX")
            .arg(key)
            .arg(ttl_seconds)
            .arg(value)
            .query_async(&mut connection)
            .await
            .map_err(|e| StashError::cache(format!("SETEX {} failed: {}", key, e)))?;
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        let mut connection = self.connection.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut connection)
            .await
            .map_err(|e| StashError::cache(format!("PING failed: {}", e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_url_is_a_cache_error() {
        let result = RedisCacheStore::connect("not-a-redis-url").await;
        assert!(matches!(result, Err(StashError::Cache { .. })));
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server (REDIS_URL)"]
    async fn test_set_then_get() {
        let url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
        let store = RedisCacheStore::connect(&url).await.unwrap();

        store.set("stash:test:key", "[]", 5).await.unwrap();
        assert_eq!(
            store.get("stash:test:key").await.unwrap().as_deref(),
            Some("[]")
        );
        assert!(store.ping().await.is_ok());
    }
}
