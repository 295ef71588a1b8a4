//! MCP tool implementations.
//!
//! Each tool delivers one kind of event to the worker: the lifecycle
//! events, an intercepted page request, or a control message.

pub mod fetch;
pub mod lifecycle;
pub mod message;

pub use fetch::{FetchOutput, FetchParams};
pub use lifecycle::{ActivateOutput, InstallOutput};
pub use message::{PostMessageOutput, PostMessageParams};

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use rmcp::model::CallToolResult;
    use tvcache_core::{AppConfig, CacheDb, Error, Event, Network, Request, Response, ServiceWorker};

    use crate::host::StdioHost;

    pub const ORIGIN: &str = "https://tv.local";

    pub fn origin() -> url::Url {
        url::Url::parse(ORIGIN).unwrap()
    }

    /// Serves the two-file shell; everything else is a 404.
    pub struct StubNetwork {
        pages: HashMap<String, Response>,
        online: AtomicBool,
    }

    impl StubNetwork {
        fn new() -> Self {
            let pages = ["/", "/index.html"]
                .into_iter()
                .map(|path| (format!("{ORIGIN}{path}"), Response::new(200, "<html>tv</html>")))
                .collect();
            Self { pages, online: AtomicBool::new(true) }
        }

        pub fn set_online(&self, online: bool) {
            self.online.store(online, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl Network for StubNetwork {
        async fn fetch(&self, request: &Request) -> Result<Response, Error> {
            if !self.online.load(Ordering::SeqCst) {
                return Err(Error::Network(format!("offline: {}", request.url)));
            }
            Ok(self.pages.get(request.url.as_str()).cloned().unwrap_or_else(|| Response::new(404, "")))
        }
    }

    fn config() -> AppConfig {
        AppConfig {
            cache_prefix: "tv".into(),
            origin: ORIGIN.into(),
            static_manifest: vec!["/".into(), "/index.html".into()],
            seed_resources: Vec::new(),
            ..Default::default()
        }
    }

    async fn worker_with(network: Arc<StubNetwork>) -> ServiceWorker {
        let db = CacheDb::open_in_memory().await.unwrap();
        ServiceWorker::new(&config(), db, network, Arc::new(StdioHost::new())).unwrap()
    }

    /// A fresh worker that has not installed yet.
    pub async fn installable_worker() -> ServiceWorker {
        worker_with(Arc::new(StubNetwork::new())).await
    }

    /// An installed and activated worker.
    pub async fn running_worker() -> (ServiceWorker, Arc<StubNetwork>) {
        let network = Arc::new(StubNetwork::new());
        let worker = worker_with(network.clone()).await;
        worker.dispatch(Event::Install).await.unwrap();
        worker.dispatch(Event::Activate).await.unwrap();
        (worker, network)
    }

    /// A running worker whose network has gone away.
    pub async fn offline_worker() -> (ServiceWorker, Arc<StubNetwork>) {
        let (worker, network) = running_worker().await;
        network.set_online(false);
        (worker, network)
    }

    /// Parse the JSON text content of a tool result.
    pub fn output_json(result: &CallToolResult) -> serde_json::Value {
        let text = result.content[0].as_text().map(|t| t.text.clone()).unwrap();
        serde_json::from_str(&text).unwrap()
    }
}
