//! Stash - read-through item cache
//!
//! Serves the `items` table from Postgres through a Redis (or in-process)
//! cache with a bounded TTL, reporting which path answered each request and
//! how long it took.

use clap::{Parser, Subcommand};
use stash_core::{Result, StashConfig};
use stash_infra::{init_logger, LoggerConfig, Resources};
use stash_serve::ServerBuilder;
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "stash")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Read-through cache for the items table")]
#[command(long_about = r#"
Stash answers item requests from a cache when it can and from Postgres when
it must, writing fetched items back to the cache with a TTL.

Configuration is read from an optional file, then STASH_<SECTION>__<FIELD>
environment variables, then DATABASE_URL and REDIS_URL.
"#)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Server host address
        #[arg(long)]
        host: Option<String>,

        /// Server port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run one retrieval and print the response as JSON
    Fetch {
        /// Bypass the cache
        #[arg(long)]
        uncached: bool,
    },

    /// Check database and cache connectivity
    Health,

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = StashConfig::load(cli.config.as_deref())?;

    let mut logger = LoggerConfig::from(&config.logging);
    if cli.verbose {
        logger.level = "debug".to_string();
    }
    if cli.json_logs {
        logger.json_format = true;
    }
    init_logger(logger)?;

    match cli.command {
        Some(Commands::Serve { host, port }) => handle_serve(config, host, port).await,
        Some(Commands::Fetch { uncached }) => handle_fetch(&config, uncached).await,
        Some(Commands::Health) => handle_health(&config).await,
        Some(Commands::Version) => {
            handle_version();
            Ok(())
        }
        None => {
            println!("No command specified. Use --help for usage information.");
            Ok(())
        }
    }
}

async fn handle_serve(
    mut config: StashConfig,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config.validate()?;

    info!("Starting Stash v{}", env!("CARGO_PKG_VERSION"));

    let resources = Resources::connect(&config).await?;
    let server =
        ServerBuilder::from_config(config.server.clone()).build(resources.retrieval_service());

    let result = server.start().await;
    if let Err(ref e) = result {
        error!("Server failed: {}", e);
    }

    resources.close().await;
    result
}

async fn handle_fetch(config: &StashConfig, uncached: bool) -> Result<()> {
    let resources = Resources::connect(config).await?;
    let service = resources.retrieval_service();

    let result = if uncached {
        service.retrieve_uncached().await
    } else {
        service.retrieve_cached().await
    };
    resources.close().await;

    let response = stash_serve::ItemsResponse::from(result?);
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

async fn handle_health(config: &StashConfig) -> Result<()> {
    let resources = Resources::connect(config).await?;
    let status = resources.health().await;
    let cache = resources.cache().name();
    resources.close().await;

    println!("Stash Health Status:");
    println!("  Database: {}", describe(status.database));
    println!("  Cache ({}): {}", cache, describe(status.cache));

    if status.is_healthy() {
        Ok(())
    } else {
        Err(stash_core::StashError::network(
            "One or more dependencies are unhealthy",
        ))
    }
}

fn describe(reachable: bool) -> &'static str {
    if reachable {
        "ok"
    } else {
        "unreachable"
    }
}

fn handle_version() {
    println!("stash {}", env!("CARGO_PKG_VERSION"));
    println!("{}", stash_core::version_info());
}
