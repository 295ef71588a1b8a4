//! Retrieval strategies.
//!
//! Both strategies write back only successful responses. The store copies
//! the body, so the caller still receives the response intact. A failed
//! write-back is logged; it never replaces a good network response with an
//! error.

use serde::{Deserialize, Serialize};

use crate::cache::{CacheDb, Generation};
use crate::http::{Destination, Request, Response};
use crate::network::Network;

/// Where a response handed back to the page came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Network,
    Cache,
    /// The synthetic 503.
    Offline,
    /// Not intercepted; the host fetched it directly.
    Passthrough,
}

/// A response plus its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Served {
    pub response: Response,
    pub source: Source,
}

impl Served {
    fn network(response: Response) -> Self {
        Self { response, source: Source::Network }
    }

    fn cache(response: Response) -> Self {
        Self { response, source: Source::Cache }
    }

    pub fn offline() -> Self {
        Self { response: Response::offline(), source: Source::Offline }
    }

    pub fn passthrough(response: Response) -> Self {
        Self { response, source: Source::Passthrough }
    }
}

/// The shell entry served to navigations that neither network nor cache
/// can satisfy.
#[derive(Debug, Clone)]
pub struct OfflineDocument<'a> {
    pub generation: &'a Generation,
    pub request: &'a Request,
}

async fn lookup(db: &CacheDb, generation: &Generation, request: &Request) -> Option<Response> {
    match db.match_entry(generation, request).await {
        Ok(hit) => hit,
        Err(e) => {
            tracing::warn!(url = %request.url, generation = %generation.name, error = %e, "cache lookup failed");
            None
        }
    }
}

async fn write_back(db: &CacheDb, generation: &Generation, request: &Request, response: &Response) {
    if let Err(e) = db.put_entry(generation, request, response).await {
        tracing::warn!(url = %request.url, generation = %generation.name, error = %e, "cache write-back failed");
    }
}

/// Serve from `generation` when present; otherwise fetch, store on success,
/// and return the network response. Transport failure yields the 503.
pub async fn cache_first(db: &CacheDb, network: &dyn Network, request: &Request, generation: &Generation) -> Served {
    if let Some(cached) = lookup(db, generation, request).await {
        tracing::debug!(url = %request.url, generation = %generation.name, "cache hit");
        return Served::cache(cached);
    }

    tracing::debug!(url = %request.url, generation = %generation.name, "cache miss, fetching");
    match network.fetch(request).await {
        Ok(response) => {
            if response.is_success() {
                write_back(db, generation, request, &response).await;
            }
            Served::network(response)
        }
        Err(e) => {
            tracing::warn!(url = %request.url, error = %e, "cache-first fetch failed");
            Served::offline()
        }
    }
}

/// Fetch first and store on success. On transport failure fall back to the
/// cached entry, then (navigations only) to the offline document, then to
/// the 503.
pub async fn network_first(
    db: &CacheDb, network: &dyn Network, request: &Request, generation: &Generation,
    offline_document: Option<OfflineDocument<'_>>,
) -> Served {
    tracing::debug!(url = %request.url, "trying network first");
    let error = match network.fetch(request).await {
        Ok(response) => {
            if response.is_success() {
                write_back(db, generation, request, &response).await;
            }
            return Served::network(response);
        }
        Err(e) => e,
    };

    tracing::info!(url = %request.url, error = %error, "network failed, trying cache");
    if let Some(cached) = lookup(db, generation, request).await {
        return Served::cache(cached);
    }

    if request.destination == Destination::Document
        && let Some(document) = offline_document
    {
        if let Some(page) = lookup(db, document.generation, document.request).await {
            tracing::debug!(url = %request.url, fallback = %document.request.url, "serving offline document");
            return Served::cache(page);
        }
        tracing::warn!(fallback = %document.request.url, "offline document missing from shell generation");
    }

    Served::offline()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::OFFLINE_BODY;
    use crate::worker::testing::{MockNetwork, url};

    async fn setup() -> (CacheDb, Generation, Generation) {
        let db = CacheDb::open_in_memory().await.unwrap();
        let shell = db.ensure_generation("static-v1").await.unwrap();
        let runtime = db.ensure_generation("dynamic-v1").await.unwrap();
        (db, shell, runtime)
    }

    #[tokio::test]
    async fn test_cache_first_miss_fetches_and_stores_once() {
        let (db, _, runtime) = setup().await;
        let network = MockNetwork::new().with(url("/media/intro.mp4").as_str(), Response::new(200, "mp4"));
        let request = Request::get(url("/media/intro.mp4")).with_destination(Destination::Video);

        let first = cache_first(&db, &network, &request, &runtime).await;
        assert_eq!(first.source, Source::Network);
        assert_eq!(network.calls(), 1);
        assert_eq!(db.entry_count("dynamic-v1").await.unwrap(), 1);

        let second = cache_first(&db, &network, &request, &runtime).await;
        assert_eq!(second.source, Source::Cache);
        assert_eq!(second.response.body, first.response.body);
        assert_eq!(network.calls(), 1);
    }

    #[tokio::test]
    async fn test_cache_first_hit_never_touches_network() {
        let (db, shell, _) = setup().await;
        let request = Request::get(url("/app.js"));
        db.put_entry(&shell, &request, &Response::new(200, "cached js")).await.unwrap();

        let network = MockNetwork::new();
        network.set_online(false);

        let served = cache_first(&db, &network, &request, &shell).await;
        assert_eq!(served.source, Source::Cache);
        assert_eq!(&served.response.body[..], b"cached js");
        assert_eq!(network.calls(), 0);
    }

    #[tokio::test]
    async fn test_cache_first_does_not_store_failures() {
        let (db, _, runtime) = setup().await;
        let network = MockNetwork::new();
        let request = Request::get(url("/media/missing.jpg")).with_destination(Destination::Image);

        let served = cache_first(&db, &network, &request, &runtime).await;
        assert_eq!(served.response.status, 404);
        assert_eq!(served.source, Source::Network);
        assert_eq!(db.entry_count("dynamic-v1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_cache_first_offline_miss_is_503() {
        let (db, _, runtime) = setup().await;
        let network = MockNetwork::new();
        network.set_online(false);
        let request = Request::get(url("/media/clip.wav")).with_destination(Destination::Audio);

        let served = cache_first(&db, &network, &request, &runtime).await;
        assert_eq!(served.source, Source::Offline);
        assert_eq!(served.response.status, 503);
        assert_eq!(&served.response.body[..], OFFLINE_BODY.as_bytes());
    }

    #[tokio::test]
    async fn test_network_first_success_stores_and_skips_cache_read() {
        let (db, _, runtime) = setup().await;
        let request = Request::get(url("/api/channels"));
        db.put_entry(&runtime, &request, &Response::new(200, "stale")).await.unwrap();

        let network = MockNetwork::new().with(url("/api/channels").as_str(), Response::new(200, "fresh"));
        let served = network_first(&db, &network, &request, &runtime, None).await;

        assert_eq!(served.source, Source::Network);
        assert_eq!(&served.response.body[..], b"fresh");
        let stored = db.match_entry(&runtime, &request).await.unwrap().unwrap();
        assert_eq!(&stored.body[..], b"fresh");
    }

    #[tokio::test]
    async fn test_network_first_error_status_is_returned_uncached() {
        let (db, _, runtime) = setup().await;
        let request = Request::get(url("/api/channels"));
        db.put_entry(&runtime, &request, &Response::new(200, "previous")).await.unwrap();

        let network = MockNetwork::new().with(url("/api/channels").as_str(), Response::new(500, "boom"));
        let served = network_first(&db, &network, &request, &runtime, None).await;

        assert_eq!(served.response.status, 500);
        let stored = db.match_entry(&runtime, &request).await.unwrap().unwrap();
        assert_eq!(&stored.body[..], b"previous");
    }

    #[tokio::test]
    async fn test_network_first_failure_returns_cached_entry_unchanged() {
        let (db, _, runtime) = setup().await;
        let request = Request::get(url("/api/epg"));
        let original = Response::new(200, "epg data").with_header("content-type", "application/json");
        db.put_entry(&runtime, &request, &original).await.unwrap();

        let network = MockNetwork::new();
        network.set_online(false);
        let served = network_first(&db, &network, &request, &runtime, None).await;

        assert_eq!(served.source, Source::Cache);
        assert_eq!(served.response, original);
    }

    #[tokio::test]
    async fn test_network_first_navigation_falls_back_to_offline_document() {
        let (db, shell, runtime) = setup().await;
        let index = Request::get(url("/index.html"));
        db.put_entry(&shell, &index, &Response::new(200, "<html>shell</html>")).await.unwrap();

        let network = MockNetwork::new();
        network.set_online(false);
        let navigation = Request::navigate(url("/guide"));
        let document = OfflineDocument { generation: &shell, request: &index };
        let served = network_first(&db, &network, &navigation, &runtime, Some(document)).await;

        assert_eq!(served.response.status, 200);
        assert_eq!(&served.response.body[..], b"<html>shell</html>");
    }

    #[tokio::test]
    async fn test_network_first_non_document_miss_is_503() {
        let (db, shell, runtime) = setup().await;
        let index = Request::get(url("/index.html"));
        db.put_entry(&shell, &index, &Response::new(200, "<html>shell</html>")).await.unwrap();

        let network = MockNetwork::new();
        network.set_online(false);
        let request = Request::get(url("/api/epg"));
        let document = OfflineDocument { generation: &shell, request: &index };
        let served = network_first(&db, &network, &request, &runtime, Some(document)).await;

        assert_eq!(served.source, Source::Offline);
        assert_eq!(served.response.status, 503);
        assert_eq!(&served.response.body[..], OFFLINE_BODY.as_bytes());
    }

    #[tokio::test]
    async fn test_network_first_missing_offline_document_is_503() {
        let (db, shell, runtime) = setup().await;
        let index = Request::get(url("/index.html"));
        let network = MockNetwork::new();
        network.set_online(false);

        let navigation = Request::navigate(url("/guide"));
        let document = OfflineDocument { generation: &shell, request: &index };
        let served = network_first(&db, &network, &navigation, &runtime, Some(document)).await;

        assert_eq!(served.response.status, 503);
    }
}
