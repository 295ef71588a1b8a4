//! Request and response values exchanged between the page, the worker and
//! the network.

use bytes::Bytes;
pub use ::http::Method;
use ::http::StatusCode;
use serde::{Deserialize, Serialize};

/// Body of the synthetic response returned when neither cache nor network
/// can satisfy a request.
pub const OFFLINE_BODY: &str = "Resource not available offline";

/// The kind of resource a request is for, as reported by the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    /// Top-level navigation.
    Document,
    Image,
    Video,
    Audio,
    Script,
    Style,
    Font,
    Manifest,
    /// fetch()/XHR and anything unclassified.
    #[default]
    Empty,
}

impl Destination {
    /// Heavy media that favors availability over freshness.
    pub fn is_media(self) -> bool {
        matches!(self, Destination::Video | Destination::Audio | Destination::Image)
    }
}

/// An intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub url: url::Url,
    pub destination: Destination,
}

impl Request {
    /// A GET request with no particular destination.
    pub fn get(url: url::Url) -> Self {
        Self { method: Method::GET, url, destination: Destination::Empty }
    }

    /// A top-level navigation to `url`.
    pub fn navigate(url: url::Url) -> Self {
        Self { method: Method::GET, url, destination: Destination::Document }
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }
}

/// A response snapshot: status line, headers and the full body.
///
/// The body is reference counted, so cloning a response to store it in a
/// generation leaves the caller's copy intact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        let status_text = StatusCode::from_u16(status)
            .ok()
            .and_then(|code| code.canonical_reason())
            .unwrap_or_default()
            .to_string();
        Self { status, status_text, headers: Vec::new(), body: body.into() }
    }

    /// The synthetic 503 returned when nothing can satisfy a request.
    pub fn offline() -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE.as_u16(), Bytes::from_static(OFFLINE_BODY.as_bytes()))
            .with_header("content-type", "text/plain; charset=utf-8")
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// True for 2xx statuses; only these are ever written to a generation.
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }
}
