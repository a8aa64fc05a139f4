//! Tool registry for MCP tools.
//!
//! Holds the tool definitions advertised by `tools/list`. The gateway
//! registers exactly one tool, [`QUERY_TOOL`].

use crate::protocol::{ToolAnnotations, ToolDefinition};
use serde_json::json;
use std::collections::BTreeMap;

/// Name of the read-only SQL tool.
pub const QUERY_TOOL: &str = "query";

/// Name of the single argument of [`QUERY_TOOL`].
pub const SQL_ARGUMENT: &str = "sql";

/// Definition of the `query` tool.
pub fn query_tool() -> ToolDefinition {
    ToolDefinition {
        name: QUERY_TOOL.to_string(),
        description: Some("Run a safe SQL query (read only)".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                SQL_ARGUMENT: { "type": "string" }
            },
            "required": [SQL_ARGUMENT]
        }),
        annotations: Some(ToolAnnotations {
            read_only_hint: Some(true),
            destructive_hint: Some(false),
        }),
    }
}

/// Registry of available MCP tools.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, ToolDefinition>,
}

impl ToolRegistry {
    /// Create a new empty tool registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the `query` tool.
    pub fn with_query_tool() -> Self {
        let mut registry = Self::new();
        registry.register(query_tool());
        registry
    }

    /// Register a tool.
    pub fn register(&mut self, tool: ToolDefinition) {
        self.tools.insert(tool.name.clone(), tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.get(name)
    }

    /// List all tools.
    pub fn list(&self) -> Vec<&ToolDefinition> {
        self.tools.values().collect()
    }

    /// Get the number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
