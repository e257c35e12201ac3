//! MCP JSON-RPC protocol bridge.
//!
//! Adapts the [`ToolRegistry`] to the MCP `list_tools` / `call_tool`
//! methods and serves it over stdio, which is how coding agents usually
//! launch local MCP servers:
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "agent-docs": {
//!       "command": "adocs",
//!       "args": ["--config", "/path/to/agent-docs.toml", "serve", "mcp"]
//!     }
//!   }
//! }
//! ```
//!
//! A tool output flagged `is_error` becomes a `CallToolResult` with
//! `isError: true`, never a JSON-RPC error, so one failed lookup does not
//! end the session.

use std::borrow::Cow;
use std::sync::Arc;

use rmcp::model::*;
use rmcp::transport::stdio;
use rmcp::{ErrorData as McpError, ServerHandler, ServiceExt};

use agent_docs_core::query::SnapshotCell;

use crate::config::Config;
use crate::export;
use crate::traits::{ToolContext, ToolOutput, ToolRegistry};

/// Bridges the tool registry to the MCP JSON-RPC protocol.
///
/// The tool set is derived from the current snapshot on every request.
#[derive(Clone)]
pub struct McpBridge {
    snapshots: Arc<SnapshotCell>,
}

impl McpBridge {
    pub fn new(snapshots: Arc<SnapshotCell>) -> Self {
        Self { snapshots }
    }

    /// Convert a tool into an rmcp `Tool` descriptor.
    fn to_mcp_tool(tool: &dyn crate::traits::Tool) -> Tool {
        let schema_value = tool.parameters_schema();
        let input_schema: Arc<serde_json::Map<String, serde_json::Value>> = match schema_value {
            serde_json::Value::Object(map) => Arc::new(map),
            _ => Arc::new(serde_json::Map::new()),
        };

        Tool {
            name: Cow::Owned(tool.name().to_string()),
            title: None,
            description: Some(Cow::Owned(tool.description().to_string())),
            input_schema,
            output_schema: None,
            annotations: Some(ToolAnnotations::new().read_only(true)),
            execution: None,
            icons: None,
            meta: None,
        }
    }

    fn to_call_result(output: ToolOutput) -> CallToolResult {
        let text = serde_json::to_string_pretty(&output.value).unwrap_or_default();
        if output.is_error {
            CallToolResult::error(vec![Content::text(text)])
        } else {
            CallToolResult::success(vec![Content::text(text)])
        }
    }

    /// Run one tool call against the current snapshot.
    pub async fn dispatch(&self, name: &str, params: serde_json::Value) -> Option<CallToolResult> {
        let snapshot = self.snapshots.load();
        let registry = ToolRegistry::for_snapshot(&snapshot);
        let tool = registry.find(name)?;

        let ctx = ToolContext::new(Arc::clone(&snapshot));
        Some(match tool.execute(params, &ctx).await {
            Ok(output) => Self::to_call_result(output),
            Err(e) => CallToolResult::error(vec![Content::text(e.to_string())]),
        })
    }

    pub fn tool_descriptors(&self) -> Vec<Tool> {
        let snapshot = self.snapshots.load();
        ToolRegistry::for_snapshot(&snapshot)
            .tools()
            .iter()
            .map(|t| Self::to_mcp_tool(t.as_ref()))
            .collect()
    }
}

impl ServerHandler for McpBridge {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "agent-docs".to_string(),
                title: Some("Agent Docs".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                description: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Compiled project documentation. Call list_documentation_pages to see every \
                 page with its token cost, then read_documentation_page for full content. \
                 Pages may list prerequisites in data_llm_require; read those first."
                    .to_string(),
            ),
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        std::future::ready(Ok(ListToolsResult::with_all_items(self.tool_descriptors())))
    }

    fn get_tool(&self, name: &str) -> Option<Tool> {
        self.tool_descriptors()
            .into_iter()
            .find(|t| t.name.as_ref() == name)
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let params = request
            .arguments
            .map(serde_json::Value::Object)
            .unwrap_or(serde_json::Value::Object(serde_json::Map::new()));

        self.dispatch(&request.name, params).await.ok_or_else(|| {
            McpError::new(
                ErrorCode::METHOD_NOT_FOUND,
                format!("no tool registered with name: {}", request.name),
                None,
            )
        })
    }
}

/// `adocs serve mcp`: serve the built artifacts over stdio until the
/// client disconnects.
pub async fn run_stdio(config: &Config) -> anyhow::Result<()> {
    let snapshot = export::load_query_server(&config.build.out_dir)?;
    tracing::info!(
        pages = snapshot.len(),
        search = snapshot.search_enabled(),
        "starting MCP server on stdio"
    );

    let bridge = McpBridge::new(Arc::new(SnapshotCell::new(snapshot)));
    let server = bridge.serve(stdio()).await?;
    server.waiting().await?;

    tracing::info!("MCP server stopped");
    Ok(())
}
