//! Stash Infrastructure Library
//!
//! Concrete collaborators for the Stash retrieval service: the Redis and
//! in-process cache stores, the Postgres item source, process-wide resource
//! management and logger setup.

pub mod logger;
pub mod memory_store;
pub mod postgres;
pub mod redis_store;
pub mod resources;

pub use logger::{init_logger, LogLevel, LoggerConfig};
pub use memory_store::MemoryCacheStore;
pub use postgres::PgItemSource;
pub use redis_store::RedisCacheStore;
pub use resources::{HealthStatus, Resources};

/// Infrastructure version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
