//! post_message tool implementation.
//!
//! Carries a control message to the worker and returns its reply, if any.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tvcache_core::{Event, EventOutcome, ServiceWorker};

use crate::error::ToolError;

/// Parameters for the post_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PostMessageParams {
    /// The message, e.g. `{"type": "CLEAR_CACHE"}`.
    pub message: Value,
}

/// Output from the post_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PostMessageOutput {
    /// The worker's reply; null when the message gets none.
    pub reply: Option<Value>,
}

/// Implementation of the post_message tool.
pub async fn post_message_impl(worker: &ServiceWorker, params: PostMessageParams) -> Result<CallToolResult, McpError> {
    let reply = match worker.dispatch(Event::Message(params.message)).await? {
        EventOutcome::Replied(reply) => reply,
        other => return Err(ToolError::OutputFailed(format!("unexpected worker outcome: {other:?}")).into()),
    };

    let reply = reply
        .map(serde_json::to_value)
        .transpose()
        .map_err(|e| ToolError::OutputFailed(e.to_string()))?;
    let output = PostMessageOutput { reply };
    let json = serde_json::to_string_pretty(&output).map_err(|e| ToolError::OutputFailed(e.to_string()))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
