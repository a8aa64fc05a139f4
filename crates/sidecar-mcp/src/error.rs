//! Error types for the MCP crate.

use thiserror::Error;

/// Errors that can occur in the MCP gateway.
#[derive(Debug, Error)]
pub enum McpError {
    /// Failed to start the server.
    #[error("failed to start MCP server: {0}")]
    StartupFailed(String),

    /// Invalid request format.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Method not handled by this server.
    #[error("method not found: {0}")]
    MethodNotFound(String),

    /// Tool not found.
    #[error("unknown tool: {name}")]
    ToolNotFound { name: String },

    /// Invalid arguments for tool.
    #[error("invalid argument for tool {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    /// No live session with this id.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// A session with this id is already registered.
    #[error("session already registered: {0}")]
    SessionExists(String),

    /// Pool configuration that cannot be served.
    #[error("execution pool misconfigured: {0}")]
    PoolMisconfigured(String),

    /// Transport error.
    #[error("transport error: {0}")]
    TransportError(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl McpError {
    /// JSON-RPC error code reported to the client for this error.
    pub fn rpc_code(&self) -> i32 {
        match self {
            McpError::SerializationError(_) => -32700,
            McpError::InvalidRequest(_) => -32600,
            McpError::MethodNotFound(_) => -32601,
            McpError::ToolNotFound { .. } | McpError::InvalidArguments { .. } => -32602,
            _ => -32603,
        }
    }
}

/// Failure reported by a query backend for a single statement.
///
/// Never propagated past the execution pool: it is turned into a failed
/// query result that the agent reads as tool output.
#[derive(Debug, Error)]
pub enum DriverError {
    /// Error from the database driver.
    #[error("{0}")]
    Database(#[from] sqlx::Error),

    /// Any other backend failure.
    #[error("{0}")]
    Other(String),
}

impl DriverError {
    /// Message shown to the agent. Server-side errors use the server's own text.
    pub fn message(&self) -> String {
        match self {
            DriverError::Database(sqlx::Error::Database(db)) => db.message().to_string(),
            other => other.to_string(),
        }
    }
}
