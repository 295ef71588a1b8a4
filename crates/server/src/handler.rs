//! MCP server handler implementation.
//!
//! The connected client plays the hosted page: it drives the worker's
//! lifecycle, routes its requests through the worker and posts control
//! messages to it.

use std::sync::Arc;

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use tvcache_core::{Network, ServiceWorker};

use crate::tools::fetch::{FetchParams, fetch_impl};
use crate::tools::lifecycle::{activate_impl, install_impl};
use crate::tools::message::{PostMessageParams, post_message_impl};

/// The main MCP server handler for tvcache.
#[derive(Clone)]
pub struct TvCacheServer {
    tool_router: ToolRouter<Self>,
    worker: Arc<ServiceWorker>,
    /// Default network handling for requests the worker passes through.
    network: Arc<dyn Network>,
    origin: url::Url,
}

#[tool_router]
impl TvCacheServer {
    pub fn new(worker: Arc<ServiceWorker>, network: Arc<dyn Network>, origin: url::Url) -> Self {
        Self { tool_router: Self::tool_router(), worker, network, origin }
    }

    /// Run the install phase for the configured version.
    #[tool(description = "Install the configured version: create its cache generations and precache the app shell.")]
    async fn install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.worker).await
    }

    /// Run the activate phase.
    #[tool(description = "Activate the installed version: delete caches from other versions and take control.")]
    async fn activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.worker).await
    }

    /// Route a page request through the worker.
    #[tool(
        description = "Request a URL as the TV app would. Returns status, headers, body and whether it came from network, cache or the offline fallback."
    )]
    async fn fetch(&self, params: Parameters<FetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.worker, self.network.as_ref(), &self.origin, params.0).await
    }

    /// Post a control message to the worker.
    #[tool(
        description = "Post a control message: {\"type\": \"SKIP_WAITING\" | \"CLEAR_CACHE\" | \"GET_CACHE_STATUS\"}. Returns the worker's reply or null."
    )]
    async fn post_message(&self, params: Parameters<PostMessageParams>) -> Result<CallToolResult, McpError> {
        post_message_impl(&self.worker, params.0).await
    }
}

impl ServerHandler for TvCacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "tvcache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
