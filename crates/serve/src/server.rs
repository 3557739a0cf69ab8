//! Server module for Stash serve crate

use crate::api::create_routes;
use crate::handlers::AppState;
use crate::middleware::timing_middleware;
use crate::ServerConfig;
use axum::{
    http::{header::ACCEPT, header::CONTENT_TYPE, HeaderValue, Method},
    middleware::from_fn,
    Router,
};
use stash_core::{Result, RetrievalService, StashError};
use std::future::Future;
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Stash HTTP server
pub struct StashServer {
    config: ServerConfig,
    app: Router,
}

impl StashServer {
    /// Create a new server around a retrieval service
    pub fn new(config: ServerConfig, service: RetrievalService) -> Self {
        let state = AppState::new(service);
        let app = create_app(&config, state);

        Self { config, app }
    }

    /// Start the server and run until Ctrl-C or SIGTERM
    pub async fn start(self) -> Result<()> {
        self.start_with_shutdown(shutdown_signal()).await
    }

    /// Start the server and run until `shutdown` resolves
    pub async fn start_with_shutdown<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let socket_addr: SocketAddr = addr
            .parse()
            .map_err(|e| StashError::validation(format!("Invalid address {}: {}", addr, e)))?;

        tracing::info!("Starting Stash server on {}", addr);

        let listener = tokio::net::TcpListener::bind(socket_addr)
            .await
            .map_err(|e| StashError::network(format!("Failed to bind to {}: {}", addr, e)))?;

        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| StashError::network(format!("Server error: {}", e)))?;

        tracing::info!("Server stopped");
        Ok(())
    }

    /// Get the server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The fully layered router, for in-process testing
    pub fn router(&self) -> Router {
        self.app.clone()
    }
}

/// Create the Axum application with middleware
pub fn create_app(config: &ServerConfig, state: AppState) -> Router {
    let mut app = create_routes().with_state(state);

    // Add middleware layers
    app = app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(RequestBodyLimitLayer::new(config.max_request_size)),
    );
    app = app.layer(from_fn(timing_middleware));

    // Add CORS if enabled
    if config.cors_enabled {
        let cors = CorsLayer::new()
            .allow_origin(HeaderValue::from_static("*"))
            .allow_methods([Method::GET])
            .allow_headers([ACCEPT, CONTENT_TYPE]);

        app = app.layer(cors);
    }

    app
}

/// Resolves on Ctrl-C, or SIGTERM on Unix
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

/// Server builder for configuration
pub struct ServerBuilder {
    config: ServerConfig,
}

impl ServerBuilder {
    /// Create a new server builder
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Start from an existing configuration
    pub fn from_config(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Set the host address
    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Enable or disable CORS
    pub fn cors(mut self, enabled: bool) -> Self {
        self.config.cors_enabled = enabled;
        self
    }

    /// Set maximum request size
    pub fn max_request_size(mut self, size: usize) -> Self {
        self.config.max_request_size = size;
        self
    }

    /// Build the server around a retrieval service
    pub fn build(self, service: RetrievalService) -> StashServer {
        StashServer::new(self.config, service)
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stash_core::testing::{FakeCacheStore, StaticItemSource};
    use stash_core::RetrievalSettings;
    use std::sync::Arc;

    fn service() -> RetrievalService {
        RetrievalService::new(
            Arc::new(FakeCacheStore::new()),
            Arc::new(StaticItemSource::new(Vec::new())),
            RetrievalSettings::default().without_delay(),
        )
    }

    #[test]
    fn test_server_builder() {
        let builder = ServerBuilder::new()
            .host("0.0.0.0")
            .port(8080)
            .cors(false)
            .max_request_size(5 * 1024 * 1024);

        assert_eq!(builder.config.host, "0.0.0.0");
        assert_eq!(builder.config.port, 8080);
        assert!(!builder.config.cors_enabled);
        assert_eq!(builder.config.max_request_size, 5 * 1024 * 1024);

        let server = builder.build(service());
        assert_eq!(server.config().port, 8080);
    }

    #[tokio::test]
    async fn test_invalid_address_is_rejected() {
        let server = ServerBuilder::new().host("not an address").build(service());
        let result = server.start_with_shutdown(async {}).await;
        assert!(matches!(result, Err(StashError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_graceful_shutdown_returns() {
        let server = ServerBuilder::new()
            .host("127.0.0.1")
            .port(0)
            .build(service());
        assert!(server.start_with_shutdown(async {}).await.is_ok());
    }
}
