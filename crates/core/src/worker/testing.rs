//! Scripted `Network` and recording `Host` for worker tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::Error;
use crate::http::{Request, Response};
use crate::network::{Host, Network};

pub(crate) const ORIGIN: &str = "https://tv.local";

pub(crate) fn url(path: &str) -> url::Url {
    url::Url::parse(ORIGIN).unwrap().join(path).unwrap()
}

/// Serves scripted responses by URL; unknown URLs get a 404.
pub(crate) struct MockNetwork {
    responses: Mutex<HashMap<String, Response>>,
    unreachable: Mutex<Vec<String>>,
    online: AtomicBool,
    calls: AtomicUsize,
}

impl MockNetwork {
    pub(crate) fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            unreachable: Mutex::new(Vec::new()),
            online: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with(self, url: &str, response: Response) -> Self {
        self.respond(url, response);
        self
    }

    pub(crate) fn respond(&self, url: &str, response: Response) {
        self.responses.lock().unwrap().insert(url.to_string(), response);
    }

    /// Requests to `url` fail at the transport level.
    pub(crate) fn unreachable(self, url: &str) -> Self {
        self.unreachable.lock().unwrap().push(url.to_string());
        self
    }

    pub(crate) fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Network for MockNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let url = request.url.as_str();
        if !self.online.load(Ordering::SeqCst) || self.unreachable.lock().unwrap().iter().any(|u| u == url) {
            return Err(Error::Network(format!("unreachable: {url}")));
        }
        let response = self.responses.lock().unwrap().get(url).cloned();
        Ok(response.unwrap_or_else(|| Response::new(404, "not found")))
    }
}

/// Counts lifecycle signals.
#[derive(Default)]
pub(crate) struct RecordingHost {
    pub(crate) skip_waiting: AtomicUsize,
    pub(crate) claims: AtomicUsize,
    pub(crate) updates: Mutex<Vec<String>>,
}

#[async_trait]
impl Host for RecordingHost {
    async fn skip_waiting(&self) {
        self.skip_waiting.fetch_add(1, Ordering::SeqCst);
    }

    async fn claim(&self) -> usize {
        self.claims.fetch_add(1, Ordering::SeqCst);
        1
    }

    async fn update_ready(&self, version: &str) {
        self.updates.lock().unwrap().push(version.to_string());
    }
}
