//! Tool trait and registry for the agent-facing query operations.
//!
//! Every transport (MCP over stdio, the HTTP tool API, the CLI) goes
//! through the same [`Tool`] implementations, so a page lookup behaves
//! identically no matter how an agent reaches it.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 ToolRegistry                 │
//! │  list_documentation_pages   → enumerate      │
//! │  read_documentation_page    → fetch          │
//! │  search_documentation       → search (opt.)  │
//! └──────────────────────┬───────────────────────┘
//!                        ▼
//!              QueryServer snapshot
//! ```
//!
//! # Usage
//!
//! ```rust
//! use agent_docs::traits::ToolRegistry;
//! use agent_docs_core::query::QueryServer;
//!
//! let snapshot = QueryServer::new(Vec::new(), None);
//! let tools = ToolRegistry::for_snapshot(&snapshot);
//! assert_eq!(tools.len(), 2);
//! ```

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use agent_docs_core::query::QueryServer;

/// Result of one tool invocation.
///
/// `is_error` marks a well-formed response that reports a failure to the
/// agent (such as an unknown page). Transports surface it in-band and keep
/// the session alive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolOutput {
    pub value: Value,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn ok(value: Value) -> Self {
        Self {
            value,
            is_error: false,
        }
    }

    pub fn error(value: Value) -> Self {
        Self {
            value,
            is_error: true,
        }
    }
}

/// A tool that agents can discover and call.
///
/// Tools are exposed via `GET /tools/list` and `POST /tools/{name}` over
/// HTTP, and via `list_tools` / `call_tool` over MCP.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the tool's name.
    ///
    /// Used as the route path (`POST /tools/{name}`) and as the MCP tool
    /// name. Lowercase with underscores.
    fn name(&self) -> &str;

    /// Returns a one-line description for agent discovery.
    fn description(&self) -> &str;

    /// Returns the JSON Schema for the tool's parameters.
    fn parameters_schema(&self) -> Value;

    /// Execute the tool against the current snapshot.
    ///
    /// Returns `Err` only for malformed parameters.
    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<ToolOutput>;
}

/// Context bridge for tool execution.
///
/// Holds the query snapshot that was current when the call started. A
/// reload mid-call does not affect it.
pub struct ToolContext {
    server: Arc<QueryServer>,
}

impl ToolContext {
    pub fn new(server: Arc<QueryServer>) -> Self {
        Self { server }
    }

    pub fn server(&self) -> &QueryServer {
        &self.server
    }
}

fn required_str<'a>(params: &'a Value, key: &str) -> Result<&'a str> {
    match params.get(key).and_then(Value::as_str) {
        Some(value) => Ok(value),
        None => anyhow::bail!("missing required string parameter '{}'", key),
    }
}

/// Enumerate every page with its summary and token cost.
pub struct ListPagesTool;

#[async_trait]
impl Tool for ListPagesTool {
    fn name(&self) -> &str {
        "list_documentation_pages"
    }

    fn description(&self) -> &str {
        "List every documentation page with a one-line summary and its token cost"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, _params: Value, ctx: &ToolContext) -> Result<ToolOutput> {
        Ok(ToolOutput::ok(serde_json::to_value(
            ctx.server().enumerate(),
        )?))
    }
}

/// Fetch one page by route path.
pub struct ReadPageTool;

#[async_trait]
impl Tool for ReadPageTool {
    fn name(&self) -> &str {
        "read_documentation_page"
    }

    fn description(&self) -> &str {
        "Read one documentation page by path, including its metadata and prerequisites"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Page path, e.g. /docs/setup" }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<ToolOutput> {
        let path = required_str(&params, "path")?;
        let outcome = ctx.server().fetch(path);
        let value = serde_json::to_value(&outcome)?;
        Ok(if outcome.is_error() {
            ToolOutput::error(value)
        } else {
            ToolOutput::ok(value)
        })
    }
}

/// Rank pages against a free-text query.
pub struct SearchTool;

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        "search_documentation"
    }

    fn description(&self) -> &str {
        "Search the documentation and return the three most relevant pages"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "Search query" }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<ToolOutput> {
        let query = required_str(&params, "query")?;
        match ctx.server().search(query) {
            Some(results) => Ok(ToolOutput::ok(serde_json::to_value(results)?)),
            None => Ok(ToolOutput::error(serde_json::json!({
                "error": "Search index not available"
            }))),
        }
    }
}

/// Registry of tools exposed for one snapshot.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty tool registry.
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Built-in tools for `snapshot`. Search is registered only when the
    /// snapshot carries an index.
    pub fn for_snapshot(snapshot: &QueryServer) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(ListPagesTool));
        registry.register(Box::new(ReadPageTool));
        if snapshot.search_enabled() {
            registry.register(Box::new(SearchTool));
        }
        registry
    }

    /// Register a tool.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(tool);
    }

    /// Get all registered tools.
    pub fn tools(&self) -> &[Box<dyn Tool>] {
        &self.tools
    }

    /// Find a tool by name.
    pub fn find(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
