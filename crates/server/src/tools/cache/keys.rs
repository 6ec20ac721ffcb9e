//! cache_keys tool implementation.
//!
//! Lists every store with its entry count.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::state::AppState;
use crate::tools::json_result;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StoreSummary {
    pub name: String,
    pub entries: usize,
    /// Whether the name matches the running version.
    pub current: bool,
}

/// Output from the cache_keys tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysOutput {
    pub stores: Vec<StoreSummary>,
}

/// Implementation of the cache_keys tool.
pub async fn keys_impl(state: &AppState) -> Result<CallToolResult, McpError> {
    let current = [state.config.static_store_name(), state.config.dynamic_store_name()];

    let mut stores = Vec::new();
    for name in state.storage.keys().await? {
        let entries = state.storage.len(&name).await?;
        stores.push(StoreSummary { current: current.contains(&name), name, entries });
    }

    json_result(&CacheKeysOutput { stores })
}
