//! Postgres item source
//!
//! Reads the whole `items` table through a sqlx connection pool.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use stash_core::{Item, ItemCollection, ItemSource, Result, StashError};
use tracing::debug;

/// Query returning every item ordered by id
///
/// `id` is widened to BIGINT so both SERIAL and BIGSERIAL columns decode.
pub const SELECT_ITEMS: &str = "SELECT id::BIGINT AS id, name FROM items ORDER BY id";

/// Item source reading from Postgres
#[derive(Clone)]
pub struct PgItemSource {
    pool: PgPool,
}

impl PgItemSource {
    /// Create a new source over an existing pool
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use sqlx::PgPool;
    /// use stash_infra::PgItemSource;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let pool = PgPool::connect("postgres://localhost/stash").await?;
    /// let source = PgItemSource::new(pool);
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ItemSource for PgItemSource {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn fetch_items(&self) -> Result<ItemCollection> {
        let rows = sqlx::query(SELECT_ITEMS)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StashError::source(format!("Failed to query items: {}", e)))?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            let id: i64 = row
                .try_get("id")
                .map_err(|e| StashError::source(format!("Failed to get id: {}", e)))?;
            let name: String = row
                .try_get("name")
                .map_err(|e| StashError::source(format!("Failed to get name: {}", e)))?;

            items.push(Item { id, name });
        }

        debug!("Retrieved {} items from Postgres", items.len());
        Ok(ItemCollection::new(items))
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StashError::source(format!("Database ping failed: {}", e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_orders_by_id() {
        assert!(SELECT_ITEMS.ends_with("ORDER BY id"));
        assert!(SELECT_ITEMS.contains("FROM items"));
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL database (DATABASE_URL)"]
    async fn test_fetch_items_from_database() {
        let url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/stash_test".to_string());
        let pool = PgPool::connect(&url).await.unwrap();
        let source = PgItemSource::new(pool);

        let items = source.fetch_items().await.unwrap();
        let ids: Vec<i64> = items.items().iter().map(|i| i.id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }
}
