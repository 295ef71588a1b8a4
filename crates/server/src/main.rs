//! tvcache server entry point.
//!
//! Boots the offline cache worker for the configured version, runs its
//! install and activate phases, then serves MCP on stdio.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;
use tvcache_client::{FetchClient, FetchConfig};
use tvcache_core::{AppConfig, CacheDb, Event, ServiceWorker};

mod error;
mod handler;
mod host;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(version = %config.version, db = %config.db_path.display(), "Starting tvcache server on stdio transport");

    let db = CacheDb::open(&config.db_path).await?;
    let network = Arc::new(FetchClient::new(FetchConfig::from(&config))?);
    let origin = url::Url::parse(&config.origin)?;
    let worker = Arc::new(ServiceWorker::new(&config, db, network.clone(), Arc::new(host::StdioHost::new()))?);

    // A failed install leaves the worker redundant; requests then pass
    // straight to the network.
    match worker.dispatch(Event::Install).await {
        Ok(_) => {
            if let Err(e) = worker.dispatch(Event::Activate).await {
                tracing::error!(error = %e, "activation failed");
            }
        }
        Err(e) => tracing::error!(error = %e, "install failed, serving without the cache"),
    }

    let handler = handler::TvCacheServer::new(worker, network, origin);
    let server = serve_server(handler, stdio()).await?;

    server.waiting().await?;

    Ok(())
}
