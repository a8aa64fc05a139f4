//! MCP server implementation.
//!
//! This module provides the protocol side of a session: it decodes JSON-RPC
//! messages, answers the MCP handshake, advertises the `query` tool and runs
//! tool calls through the admission gate and the execution pool.

use crate::admission::{Classification, classify};
use crate::error::McpError;
use crate::pool::{ExecutionPool, QueryResult};
use crate::protocol::*;
use crate::tools::{QUERY_TOOL, SQL_ARGUMENT, ToolRegistry};
use serde_json::{Value, json};
use std::sync::Arc;

/// Name reported in `serverInfo`.
pub const SERVER_NAME: &str = "mysql-sidecar";

/// The MCP server.
pub struct McpServer {
    tools: ToolRegistry,
    pool: Arc<ExecutionPool>,
}

impl McpServer {
    /// Create a server that executes admitted queries on `pool`.
    pub fn new(pool: Arc<ExecutionPool>) -> Self {
        Self {
            tools: ToolRegistry::with_query_tool(),
            pool,
        }
    }

    /// Get a reference to the tool registry.
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Get a reference to the execution pool.
    pub fn pool(&self) -> &Arc<ExecutionPool> {
        &self.pool
    }

    /// Decode a raw message body and handle it.
    ///
    /// Returns `None` when the message is a notification.
    pub async fn handle_message(&self, body: &[u8]) -> Option<JsonRpcResponse> {
        match serde_json::from_slice::<JsonRpcRequest>(body) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => {
                tracing::warn!(error = %e, "Received malformed JSON-RPC message");
                Some(JsonRpcResponse::error(
                    None,
                    -32700,
                    format!("Parse error: {}", e),
                ))
            }
        }
    }

    /// Handle a JSON-RPC request.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            tracing::debug!(method = %request.method, "Received notification");
            return None;
        }

        let id = request.id.clone();
        let result = match request.method.as_str() {
            "initialize" => self.handle_initialize(request.params),
            "ping" => Ok(json!({})),
            "tools/list" => self.handle_list_tools(),
            "tools/call" => self.handle_call_tool(request.params).await,
            other => Err(McpError::MethodNotFound(other.to_string())),
        };

        Some(match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => JsonRpcResponse::error(id, e.rpc_code(), e.to_string()),
        })
    }

    fn handle_initialize(&self, params: Option<Value>) -> Result<Value, McpError> {
        let params: InitializeParams = match params {
            Some(p) => serde_json::from_value(p)
                .map_err(|e| McpError::InvalidRequest(format!("invalid initialize params: {}", e)))?,
            None => InitializeParams::default(),
        };

        let protocol_version = params
            .protocol_version
            .filter(|v| SUPPORTED_PROTOCOL_VERSIONS.contains(&v.as_str()))
            .unwrap_or_else(|| LATEST_PROTOCOL_VERSION.to_string());

        let result = InitializeResult {
            protocol_version,
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            capabilities: json!({ "tools": {} }),
        };
        Ok(serde_json::to_value(result)?)
    }

    fn handle_list_tools(&self) -> Result<Value, McpError> {
        let response = ListToolsResponse {
            tools: self.tools.list().into_iter().cloned().collect(),
        };
        Ok(serde_json::to_value(response)?)
    }

    async fn handle_call_tool(&self, params: Option<Value>) -> Result<Value, McpError> {
        let params: CallToolParams = match params {
            Some(p) => serde_json::from_value(p).map_err(|e| McpError::InvalidArguments {
                tool: "unknown".to_string(),
                reason: format!("invalid params: {}", e),
            })?,
            None => return Err(McpError::InvalidRequest("missing params".to_string())),
        };
        let response = self.call_tool(params).await?;
        Ok(serde_json::to_value(response)?)
    }

    /// Run a tool call.
    ///
    /// Usage errors (unknown tool, bad `sql` argument) are returned as `Err`.
    /// Rejected statements and database failures are successful calls whose
    /// payload has `isError` set.
    pub async fn call_tool(&self, params: CallToolParams) -> Result<CallToolResponse, McpError> {
        if params.name != QUERY_TOOL || self.tools.get(&params.name).is_none() {
            return Err(McpError::ToolNotFound { name: params.name });
        }

        let sql = extract_sql(&params.arguments)?;

        if let Classification::Rejected { reason } = classify(sql) {
            tracing::warn!(sql = %sql, "Rejected non read-only query");
            return Ok(CallToolResponse::error_text(reason));
        }

        tracing::info!(sql = %sql, "Executing SQL query");
        match self.pool.execute(sql).await {
            QueryResult::Rows(rows) => Ok(CallToolResponse::text(serde_json::to_string_pretty(
                &rows,
            )?)),
            QueryResult::Failed(message) => Ok(CallToolResponse::error_text(format!(
                "MySQL error: {}",
                message
            ))),
        }
    }
}

/// Pull the SQL text out of the tool arguments.
///
/// Accepts `{"sql": "..."}` or `{"sql": ["...", ...]}`, in which case the
/// first element is used.
pub fn extract_sql(arguments: &Value) -> Result<&str, McpError> {
    let value = match arguments.get(SQL_ARGUMENT) {
        Some(Value::Array(items)) => items.first(),
        other => other,
    };

    value
        .and_then(Value::as_str)
        .ok_or_else(|| McpError::InvalidArguments {
            tool: QUERY_TOOL.to_string(),
            reason: "`sql` must be a string or a list whose first element is a string".to_string(),
        })
}
