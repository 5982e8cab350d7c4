//! MCP server providing sandboxed filesystem tools.
//!
//! All operations are restricted to a set of allowed directories configured
//! at server startup. Every path goes through [`validate::validate_path`]
//! before the filesystem is touched, and every failure is reported to the
//! client as an error-flagged tool result rather than a protocol error.

use rmcp::{
    ErrorData, RoleServer, ServerHandler,
    handler::server::{router::tool::ToolRouter, tool::ToolCallContext},
    model::{
        CallToolRequestParams, CallToolResult, Implementation, ListToolsResult,
        PaginatedRequestParams, ServerCapabilities, ServerInfo,
    },
    service::RequestContext,
};
use std::sync::Arc;
use validate::AllowedRoots;

pub mod error;
pub mod gateway;
pub mod ops;
pub mod search;
pub mod tools;
pub mod tree;
pub mod validate;

pub use error::FsError;

/// MCP filesystem server with directory-level access control.
#[derive(Debug, Clone)]
pub struct FilesystemServer {
    pub(crate) roots: Arc<AllowedRoots>,
    pub(crate) tool_router: ToolRouter<Self>,
}

impl FilesystemServer {
    /// The directories this server is confined to.
    pub fn allowed_roots(&self) -> &AllowedRoots {
        &self.roots
    }

    fn has_tool(&self, name: &str) -> bool {
        self.tool_router
            .list_all()
            .iter()
            .any(|tool| tool.name.as_ref() == name)
    }
}

impl ServerHandler for FilesystemServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "sandbox-fs".into(),
                title: Some("Sandboxed Filesystem Server".into()),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            instructions: Some(
                "Filesystem server providing file and directory operations confined to the allowed directories. Call list_allowed_directories first."
                    .into(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult {
            meta: None,
            tools: self.tool_router.list_all(),
            next_cursor: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let name = request.name.to_string();
        tracing::debug!(tool = %name, "call");
        let result = match self
            .tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
        {
            Ok(result) => result,
            Err(err) => gateway::router_failure(&name, self.has_tool(&name), &err),
        };
        if result.is_error == Some(true) {
            tracing::warn!(tool = %name, "tool call failed");
        }
        Ok(result)
    }
}
