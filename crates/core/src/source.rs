//! Authoritative item source seam

use crate::error::Result;
use crate::types::ItemCollection;
use async_trait::async_trait;

/// Read-only access to the authoritative item table
#[async_trait]
pub trait ItemSource: Send + Sync {
    /// Backend label used in logs and health output
    fn name(&self) -> &'static str;

    /// Fetch every item, ordered by ascending id
    ///
    /// # Errors
    ///
    /// Returns `StashError::Source` when the source is unreachable or the
    /// rows cannot be decoded
    async fn fetch_items(&self) -> Result<ItemCollection>;

    /// Connectivity probe
    async fn ping(&self) -> Result<()> {
        self.fetch_items().await.map(|_| ())
    }
}
