//! fetch tool implementation.
//!
//! Delivers a page request to the worker. Requests the worker does not
//! intercept are fetched directly, as the page's default network handling
//! would.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tvcache_client::resolve;
use tvcache_core::worker::{Served, Source};
use tvcache_core::{Destination, Event, EventOutcome, FetchOutcome, Method, Network, Request, ServiceWorker};

use crate::error::ToolError;

/// Input parameters for the fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FetchParams {
    /// Absolute URL, or a path relative to the app origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default)]
    pub method: Option<String>,

    /// Requested resource kind: document, image, video, audio, script,
    /// style, font, manifest or empty (default).
    #[serde(default)]
    pub destination: Option<Destination>,
}

/// A response header.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Header {
    pub name: String,
    pub value: String,
}

/// Output structure for the fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FetchOutput {
    /// The resolved request URL.
    pub url: String,
    /// HTTP status code.
    pub status: u16,
    /// HTTP status text.
    pub status_text: String,
    /// Response headers in received order.
    pub headers: Vec<Header>,
    /// Body decoded as UTF-8 (lossy).
    pub body: String,
    /// Body length in bytes.
    pub body_bytes: usize,
    /// Where the response came from.
    pub source: Source,
}

impl FetchOutput {
    fn new(request: &Request, served: Served) -> Self {
        let Served { response, source } = served;
        Self {
            url: request.url.to_string(),
            status: response.status,
            status_text: response.status_text,
            headers: response
                .headers
                .into_iter()
                .map(|(name, value)| Header { name, value })
                .collect(),
            body: String::from_utf8_lossy(&response.body).into_owned(),
            body_bytes: response.body.len(),
            source,
        }
    }
}

/// Build the worker-side request from tool parameters.
pub fn build_request(origin: &url::Url, params: &FetchParams) -> Result<Request, ToolError> {
    let url = resolve(origin, &params.url).map_err(|e| ToolError::InvalidInput(e.to_string()))?;
    let method = match params.method.as_deref() {
        Some(method) => Method::from_bytes(method.trim().to_ascii_uppercase().as_bytes())
            .map_err(|e| ToolError::InvalidInput(format!("invalid method {method}: {e}")))?,
        None => Method::GET,
    };
    Ok(Request { method, url, destination: params.destination.unwrap_or_default() })
}

/// Implementation of the fetch tool.
pub async fn fetch_impl(
    worker: &ServiceWorker, network: &dyn Network, origin: &url::Url, params: FetchParams,
) -> Result<CallToolResult, McpError> {
    let request = build_request(origin, &params)?;

    let served = match worker.dispatch(Event::Fetch(request.clone())).await? {
        EventOutcome::Fetched(FetchOutcome::Respond(served)) => served,
        EventOutcome::Fetched(FetchOutcome::PassThrough) => Served::passthrough(network.fetch(&request).await?),
        other => return Err(ToolError::OutputFailed(format!("unexpected worker outcome: {other:?}")).into()),
    };

    let output = FetchOutput::new(&request, served);
    let json = serde_json::to_string_pretty(&output).map_err(|e| ToolError::OutputFailed(e.to_string()))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
