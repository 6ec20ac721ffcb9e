//! cache_get tool implementation.
//!
//! Retrieves a stored response by URL, from one store or from all of them.

use pwa_cache_client::resolve;
use pwa_cache_core::{Error, Request};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::state::AppState;
use crate::tools::json_result;

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// Absolute URL, or a path relative to the application origin.
    pub url: String,

    /// Store to search. Searches every store, oldest first, when omitted.
    #[serde(default)]
    pub store: Option<String>,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body_bytes: usize,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(state: &AppState, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let url = resolve(&params.url, &state.origin).map_err(Error::from)?;
    let request = Request::get(url);

    let found = match params.store.as_deref() {
        Some(store) => state.storage.match_in(store, &request).await?,
        None => state.storage.match_any(&request).await?,
    };
    let response = found.ok_or_else(|| Error::CacheMiss(request.url.to_string()))?;

    json_result(&CacheGetOutput {
        url: request.url.to_string(),
        status: response.status,
        body_bytes: response.body.len(),
        headers: response.headers,
    })
}
