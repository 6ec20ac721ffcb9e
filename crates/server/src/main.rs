//! pwa-cache server entry point.
//!
//! Loads configuration, boots the configured offline worker over the SQLite
//! cache, and serves its tools on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use pwa_cache_client::{FetchConfig, HttpNetwork, Network};
use pwa_cache_core::{AppConfig, CacheDb, CacheStorage};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod handler;
mod state;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(
        strategy = ?config.strategy,
        version = %config.cache_version,
        db_path = %config.db_path.display(),
        "Starting pwa-cache server on stdio transport"
    );

    let storage: Arc<dyn CacheStorage> = Arc::new(CacheDb::open(&config.db_path).await?);
    let network: Arc<dyn Network> = Arc::new(HttpNetwork::new(FetchConfig::from(&config))?);
    let state = state::AppState::boot(config, storage, network).await?;

    let handler = handler::PwaCacheServer::new(Arc::new(state));
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
