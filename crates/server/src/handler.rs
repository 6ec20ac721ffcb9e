//! MCP surface of the worker: one tool per thing a page or an operator
//! can do to it.

use std::sync::Arc;

use crate::state::AppState;
use crate::tools::cache::{CacheGetParams, get_impl, keys_impl};
use crate::tools::sw_fetch::{SwFetchParams, fetch_impl};
use crate::tools::sw_message::{SwMessageParams, message_impl};

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

#[derive(Clone)]
pub struct PwaCacheServer {
    tool_router: ToolRouter<Self>,
    state: Arc<AppState>,
}

#[tool_router]
impl PwaCacheServer {
    /// `state` must already be booted (installed and activated).
    pub fn new(state: Arc<AppState>) -> Self {
        Self { tool_router: Self::tool_router(), state }
    }

    #[tool(
        description = "Send a request through the offline worker. Returns status, body preview, and whether it was served from cache, network, offline fallback, or passed through."
    )]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.state, params.0).await
    }

    #[tool(description = "Post a control message (SKIP_WAITING or CLEAR_CACHE) to the offline worker.")]
    async fn sw_message(&self, params: Parameters<SwMessageParams>) -> Result<CallToolResult, McpError> {
        message_impl(&self.state, params.0).await
    }

    #[tool(description = "List cache stores with entry counts and whether they belong to the running version.")]
    async fn cache_keys(&self) -> Result<CallToolResult, McpError> {
        keys_impl(&self.state).await
    }

    #[tool(description = "Read a stored response by URL from one cache store, or from all stores.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.state, params.0).await
    }
}

impl ServerHandler for PwaCacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "pwa-cache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(format!(
                "Offline cache worker for {} ({:?}, version {}). Use sw_fetch as a page would, sw_message to control \
                 the worker, cache_keys and cache_get to inspect stores.",
                self.state.config.origin, self.state.config.strategy, self.state.config.cache_version
            )),
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
