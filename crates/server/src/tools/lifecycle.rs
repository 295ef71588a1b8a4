//! install and activate tool implementations.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tvcache_core::{Event, EventOutcome, ServiceWorker};

use crate::error::ToolError;

/// Output from the install tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InstallOutput {
    /// Worker state after install.
    pub state: String,
    /// Version that was installed.
    pub version: String,
    /// Generations present in the store.
    pub generations: Vec<String>,
}

/// Output from the activate tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ActivateOutput {
    /// Worker state after activation.
    pub state: String,
    /// Stale generations removed.
    pub deleted: Vec<String>,
    /// Stale generations that could not be removed.
    pub failed: Vec<String>,
    /// Sessions claimed.
    pub claimed: usize,
}

fn text<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output).map_err(|e| ToolError::OutputFailed(e.to_string()))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Implementation of the install tool.
pub async fn install_impl(worker: &ServiceWorker) -> Result<CallToolResult, McpError> {
    worker.dispatch(Event::Install).await?;

    let output = InstallOutput {
        state: worker.state().await.to_string(),
        version: worker.names().version().to_string(),
        generations: worker.manager().list_generations().await?,
    };
    text(&output)
}

/// Implementation of the activate tool.
pub async fn activate_impl(worker: &ServiceWorker) -> Result<CallToolResult, McpError> {
    let EventOutcome::Activated(report) = worker.dispatch(Event::Activate).await? else {
        return Err(ToolError::OutputFailed("activation produced no report".into()).into());
    };

    let output = ActivateOutput {
        state: worker.state().await.to_string(),
        deleted: report.deleted,
        failed: report.failed,
        claimed: report.claimed,
    };
    text(&output)
}
