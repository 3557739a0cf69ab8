//! Cache store seam
//!
//! The retrieval service talks to the cache only through [`CacheStore`]:
//! an opaque string-keyed store whose entries expire on their own. Expired
//! entries must be indistinguishable from entries that were never written.

use crate::error::Result;
use async_trait::async_trait;

/// Key-value store with per-entry expiry
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Backend label used in logs and health output
    fn name(&self) -> &'static str;

    /// Returns the stored value if present and unexpired
    ///
    /// # Errors
    ///
    /// Returns `StashError::Cache` when the store cannot be reached
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Writes or overwrites `key`, restarting its expiry at `ttl_seconds`
    ///
    /// The previous value and its expiry are replaced atomically.
    ///
    /// # Errors
    ///
    /// Returns `StashError::Cache` when the write is not acknowledged
    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()>;

    /// Connectivity probe
    async fn ping(&self) -> Result<()> {
        self.get("__stash_ping__").await.map(|_| ())
    }
}
