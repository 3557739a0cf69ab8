//! Stash Core Library
//!
//! Core functionality for the Stash item cache: the item data model, the
//! cache store and item source seams, configuration, and the read-through
//! retrieval service that ties them together.

pub mod cache;
pub mod config;
pub mod error;
pub mod retrieval;
pub mod source;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export commonly used types
pub use cache::CacheStore;
pub use config::{CacheBackend, StashConfig};
pub use error::{ErrorCategory, Result, StashError};
pub use retrieval::{RetrievalService, RetrievalSettings};
pub use source::ItemSource;
pub use types::{
    Item, ItemCollection, Provenance, RetrievalResult, DEFAULT_TTL_SECONDS, ITEMS_CACHE_KEY,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get version info as a formatted string
pub fn version_info() -> String {
    format!("{} v{} - {}", NAME, VERSION, DESCRIPTION)
}
