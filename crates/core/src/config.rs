//! Configuration types for Stash
//!
//! Configuration is layered with the `config` crate: built-in defaults, then
//! an optional file, then `STASH_<SECTION>__<FIELD>` environment variables,
//! then the plain `DATABASE_URL` / `REDIS_URL` variables.

use crate::error::{Result, StashError};
use crate::types::{DEFAULT_TTL_SECONDS, ITEMS_CACHE_KEY};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Environment variable prefix for layered configuration
pub const ENV_PREFIX: &str = "STASH";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StashConfig {
    /// HTTP server settings
    pub server: ServerConfig,
    /// Authoritative Postgres source
    pub database: DatabaseConfig,
    /// Cache store settings
    pub cache: CacheConfig,
    /// Retrieval behaviour
    pub retrieval: RetrievalConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_enabled: bool,
    pub max_request_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            cors_enabled: true,
            max_request_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// Postgres connection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/stash".to_string(),
            max_connections: 5,
            acquire_timeout_seconds: 5,
        }
    }
}

/// Cache backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// Shared Redis server
    Redis,
    /// In-process store, lost on restart
    Memory,
}

impl std::fmt::Display for CacheBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Redis => write!(f, "redis"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

impl std::str::FromStr for CacheBackend {
    type Err = StashError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "redis" => Ok(Self::Redis),
            "memory" | "mem" => Ok(Self::Memory),
            _ => Err(StashError::validation(format!(
                "Invalid cache backend: {}",
                s
            ))),
        }
    }
}

/// Cache store configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    /// Redis connection URL, ignored by the memory backend
    pub url: String,
    /// Key holding the serialized item collection
    pub key: String,
    pub ttl_seconds: u64,
    /// Entry limit for the memory backend
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Redis,
            url: "redis://127.0.0.1:6379".to_string(),
            key: ITEMS_CACHE_KEY.to_string(),
            ttl_seconds: DEFAULT_TTL_SECONDS,
            max_capacity: 1000,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Artificial delay before each source fetch, 0 disables it
    pub fetch_delay_ms: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            fetch_delay_ms: 800,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl StashConfig {
    /// Load configuration from an optional file and the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let env_vars: HashMap<String, String> = std::env::vars().collect();
        Self::load_with_env(path, &env_vars)
    }

    /// Load configuration from an optional file and an explicit environment
    ///
    /// # Errors
    ///
    /// Returns `StashError::Config` when the file is missing or malformed, and
    /// `StashError::Validation` when the merged configuration is unusable
    pub fn load_with_env(path: Option<&Path>, env_vars: &HashMap<String, String>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(Some(env_vars.clone().into_iter().collect())),
            )
            .set_override_option("database.url", env_vars.get("DATABASE_URL").cloned())?
            .set_override_option("cache.url", env_vars.get("REDIS_URL").cloned())?;

        let config: StashConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        tracing::debug!(
            backend = %config.cache.backend,
            ttl_seconds = config.cache.ttl_seconds,
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(StashError::validation("Port cannot be 0"));
        }

        if self.server.max_request_size == 0 {
            return Err(StashError::validation("Max request size cannot be 0"));
        }

        if self.database.url.trim().is_empty() {
            return Err(StashError::validation("Database URL cannot be empty"));
        }

        if self.database.max_connections == 0 {
            return Err(StashError::validation(
                "Database max_connections cannot be 0",
            ));
        }

        if self.cache.key.trim().is_empty() {
            return Err(StashError::validation("Cache key cannot be empty"));
        }

        if self.cache.ttl_seconds == 0 {
            return Err(StashError::validation("Cache TTL cannot be 0"));
        }

        if self.cache.backend == CacheBackend::Redis && self.cache.url.trim().is_empty() {
            return Err(StashError::validation(
                "Redis URL is required for the redis cache backend",
            ));
        }

        if self.cache.backend == CacheBackend::Memory && self.cache.max_capacity == 0 {
            return Err(StashError::validation(
                "Cache max_capacity cannot be 0 for the memory cache backend",
            ));
        }

        Ok(())
    }
}
