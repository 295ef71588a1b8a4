//! Host environment for a worker running behind the stdio server.
//!
//! There is exactly one client session (the stdio peer), so claiming always
//! takes over that one session.

use async_trait::async_trait;
use tvcache_core::Host;

/// Logs lifecycle signals. Worker-side state lives in the worker itself.
#[derive(Debug, Default)]
pub struct StdioHost;

impl StdioHost {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Host for StdioHost {
    async fn skip_waiting(&self) {
        tracing::info!("skip waiting requested");
    }

    async fn claim(&self) -> usize {
        tracing::info!("claimed stdio session");
        1
    }

    async fn update_ready(&self, version: &str) {
        tracing::info!(version, "new version installed and waiting");
    }
}
