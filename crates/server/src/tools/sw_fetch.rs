//! sw_fetch tool implementation.
//!
//! Routes a request through the worker exactly as a page would, and reports
//! which strategy served it.

use pwa_cache_client::{FetchOutcome, ResponseSource, resolve};
use pwa_cache_core::{Destination, Error, Request, Response};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use crate::state::AppState;

/// Largest body excerpt returned in the output.
const BODY_PREVIEW_BYTES: usize = 2048;

/// Input parameters for sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// Absolute URL, or a path relative to the application origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Request destination, e.g. "document" for a page navigation (default: "empty").
    #[serde(default)]
    pub destination: Destination,
}

fn default_method() -> String {
    "GET".into()
}

/// Output structure for sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchOutput {
    pub url: String,
    pub method: String,
    /// "cache", "network", "offline_fallback", or "pass_through".
    pub source: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body_bytes: usize,
    /// Leading part of the body, lossily decoded as UTF-8.
    pub body_preview: String,
}

impl SwFetchOutput {
    fn new(request: &Request, source: &str, response: &Response) -> Self {
        let preview = &response.body[..response.body.len().min(BODY_PREVIEW_BYTES)];
        Self {
            url: request.url.to_string(),
            method: request.method.clone(),
            source: source.to_string(),
            status: response.status,
            content_type: response.content_type().map(str::to_string),
            body_bytes: response.body.len(),
            body_preview: String::from_utf8_lossy(preview).into_owned(),
        }
    }
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl(state: &AppState, params: SwFetchParams) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()).into());
    }
    if params.method.trim().is_empty() {
        return Err(Error::InvalidInput("method cannot be empty".into()).into());
    }

    let url = resolve(&params.url, &state.origin).map_err(Error::from)?;
    let request = Request::new(params.method.trim(), url, params.destination);

    let output = match state.worker.handle_fetch(&request).await? {
        FetchOutcome::Respond { response, source } => {
            let source = match source {
                ResponseSource::Cache => "cache",
                ResponseSource::Network => "network",
                ResponseSource::OfflineFallback => "offline_fallback",
            };
            SwFetchOutput::new(&request, source, &response)
        }
        FetchOutcome::PassThrough => {
            let response = state.network.fetch(&request).await?;
            SwFetchOutput::new(&request, "pass_through", &response)
        }
    };

    tracing::debug!(url = %output.url, source = %output.source, status = output.status, "sw_fetch");
    json_result(&output)
}
