//! Stash Serve Library
//!
//! HTTP interface for the Stash item cache: an uncached and a cached items
//! endpoint reporting provenance and latency, plus health and version.

pub mod api;
pub mod handlers;
pub mod middleware;
pub mod server;

pub use handlers::*;
pub use server::*;
pub use stash_core::config::ServerConfig;

/// Server version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 3000);
        assert!(config.cors_enabled);
    }
}
