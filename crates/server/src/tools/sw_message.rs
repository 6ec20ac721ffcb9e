//! sw_message tool implementation.
//!
//! The caller is treated as a page: it connects for the duration of the
//! call, posts its message, and gets back whatever notices the worker
//! posted to it in response.

use pwa_cache_client::MessageOutcome;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::json_result;
use crate::state::AppState;

/// Parameters for the sw_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwMessageParams {
    /// Message type: "SKIP_WAITING" or "CLEAR_CACHE". Other values are ignored.
    #[serde(rename = "type")]
    pub message_type: String,
}

/// Output from the sw_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwMessageOutput {
    /// "ignored", "skipped_waiting", or "cache_cleared".
    pub outcome: String,
    pub stores_deleted: usize,
    /// Pages reached by the broadcast, the caller included.
    pub pages_notified: usize,
    /// Notices delivered to the caller, e.g. `{"type": "CACHE_CLEARED", "message": ...}`.
    pub notices: Vec<serde_json::Value>,
}

impl From<MessageOutcome> for SwMessageOutput {
    fn from(outcome: MessageOutcome) -> Self {
        let (outcome, stores_deleted, pages_notified) = match outcome {
            MessageOutcome::Ignored => ("ignored", 0, 0),
            MessageOutcome::SkippedWaiting => ("skipped_waiting", 0, 0),
            MessageOutcome::CacheCleared { stores_deleted, pages_notified } => {
                ("cache_cleared", stores_deleted, pages_notified)
            }
        };
        Self { outcome: outcome.into(), stores_deleted, pages_notified, notices: Vec::new() }
    }
}

/// Implementation of the sw_message tool.
pub async fn message_impl(state: &AppState, params: SwMessageParams) -> Result<CallToolResult, McpError> {
    let (page, mut inbox) = state.clients.connect().await;

    let payload = json!({ "type": params.message_type });
    let outcome = state.worker.handle_message(&payload).await;

    state.clients.disconnect(page).await;
    let mut output = SwMessageOutput::from(outcome);
    while let Ok(notice) = inbox.try_recv() {
        output.notices.push(serde_json::to_value(notice).map_err(pwa_cache_core::Error::from)?);
    }

    json_result(&output)
}
