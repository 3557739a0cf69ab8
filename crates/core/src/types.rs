//! Data model for the item cache

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::time::Duration;

/// Cache key addressing the whole item collection
pub const ITEMS_CACHE_KEY: &str = "items:all";

/// Default lifetime of a cache entry in seconds
pub const DEFAULT_TTL_SECONDS: u64 = 30;

/// A single row of the authoritative `items` table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub name: String,
}

impl Item {
    pub fn new<S: Into<String>>(id: i64, name: S) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Items ordered by ascending id.
///
/// This is the unit of caching: one cache entry holds the whole collection,
/// serialized as a bare JSON array of `{"id", "name"}` objects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ItemCollection(Vec<Item>);

impl ItemCollection {
    /// Build a collection, ordering the items by id
    pub fn new(mut items: Vec<Item>) -> Self {
        items.sort_by_key(|item| item.id);
        Self(items)
    }

    pub fn items(&self) -> &[Item] {
        &self.0
    }

    pub fn into_items(self) -> Vec<Item> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Serialize into the cache value format
    pub fn to_cache_value(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parse a value previously written by [`ItemCollection::to_cache_value`]
    pub fn from_cache_value(value: &str) -> serde_json::Result<Self> {
        serde_json::from_str(value)
    }
}

impl<'de> Deserialize<'de> for ItemCollection {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Vec::<Item>::deserialize(deserializer).map(Self::new)
    }
}

impl From<Vec<Item>> for ItemCollection {
    fn from(items: Vec<Item>) -> Self {
        Self::new(items)
    }
}

impl IntoIterator for ItemCollection {
    type Item = Item;
    type IntoIter = std::vec::IntoIter<Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Which path produced a retrieval result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Served from a cache hit
    Cache,
    /// Fetched from the authoritative source without touching the cache
    Source,
    /// Cache miss, fetched from the source and written back
    SourceThenCached,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Source => "source",
            Self::SourceThenCached => "source_then_cached",
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one retrieval request
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalResult {
    pub provenance: Provenance,
    pub elapsed: Duration,
    pub items: ItemCollection,
}

impl RetrievalResult {
    pub fn new(provenance: Provenance, elapsed: Duration, items: ItemCollection) -> Self {
        Self {
            provenance,
            elapsed,
            items,
        }
    }

    /// Elapsed wall-clock time in milliseconds, rounded to 2 decimal places
    pub fn elapsed_ms(&self) -> f64 {
        round_millis(self.elapsed)
    }
}

fn round_millis(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 1000.0 * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_is_ordered_by_id() {
        let collection = ItemCollection::new(vec![
            Item::new(3, "c"),
            Item::new(1, "a"),
            Item::new(2, "b"),
        ]);
        let ids: Vec<i64> = collection.items().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_cache_value_format() {
        let collection = ItemCollection::new(vec![Item::new(1, "a"), Item::new(2, "b")]);
        let value = collection.to_cache_value().unwrap();
        assert_eq!(value, r#"[{"id":1,"name":"a"},{"id":2,"name":"b"}]"#);
    }

    #[test]
    fn test_cache_value_preserves_names() {
        let collection = ItemCollection::new(vec![
            Item::new(7, "naïve \"quoted\" name"),
            Item::new(-4, ""),
            Item::new(i64::MAX, "max"),
        ]);
        let value = collection.to_cache_value().unwrap();
        let restored = ItemCollection::from_cache_value(&value).unwrap();
        assert_eq!(restored, collection);
    }

    #[test]
    fn test_deserialize_sorts_unordered_input() {
        let restored =
            ItemCollection::from_cache_value(r#"[{"id":2,"name":"b"},{"id":1,"name":"a"}]"#)
                .unwrap();
        assert_eq!(restored.items()[0], Item::new(1, "a"));
    }

    #[test]
    fn test_corrupt_cache_value_is_an_error() {
        assert!(ItemCollection::from_cache_value("not json").is_err());
        assert!(ItemCollection::from_cache_value(r#"{"id":1}"#).is_err());
    }

    #[test]
    fn test_provenance_tags() {
        assert_eq!(
            serde_json::to_string(&Provenance::SourceThenCached).unwrap(),
            r#""source_then_cached""#
        );
        assert_eq!(Provenance::Cache.to_string(), "cache");
        assert_eq!(Provenance::Source.as_str(), "source");
    }

    #[test]
    fn test_elapsed_ms_rounding() {
        let result = RetrievalResult::new(
            Provenance::Cache,
            Duration::from_micros(1_234_567),
            ItemCollection::default(),
        );
        assert_eq!(result.elapsed_ms(), 1234.57);

        let zero = RetrievalResult::new(
            Provenance::Cache,
            Duration::ZERO,
            ItemCollection::default(),
        );
        assert_eq!(zero.elapsed_ms(), 0.0);
    }
}
