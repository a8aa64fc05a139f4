//! # sidecar-mcp
//!
//! MCP (Model Context Protocol) gateway that lets a remote AI agent run
//! read-only SQL against a MySQL database without holding its credentials.
//!
//! - **SSE transport**: one long-lived `GET /sse` stream per session,
//!   messages posted to `POST /messages?sessionId=<id>`
//! - **One tool**: `query`, taking a single `sql` string
//! - **Admission gate**: only statements starting with a read verb reach the
//!   database
//! - **Bounded pool**: at most `max_connections` statements run at once,
//!   further callers queue
//!
//! ## Architecture
//!
//! ```text
//! AI Agent
//!    │  GET /sse  (server → client events)
//!    │  POST /messages?sessionId=…  (client → server messages)
//!    ▼
//! ┌──────────────────────┐
//! │ transport            │  session open / message routing
//! │   SessionRegistry    │  id → inbound queue
//! ├──────────────────────┤
//! │ server (McpServer)   │  initialize, tools/list, tools/call
//! │   admission::classify│  lexical read-only gate
//! │   ExecutionPool      │  semaphore + sqlx MySQL pool
//! └──────────┬───────────┘
//!            ▼
//!          MySQL
//! ```
//!
//! ## Example Usage
//!
//! ```ignore
//! use sidecar_core::SidecarConfig;
//! use sidecar_mcp::{ExecutionPool, HttpServer, McpServer};
//! use std::sync::Arc;
//!
//! let config = SidecarConfig::from_file("sidecar.yaml")?;
//! let pool = Arc::new(ExecutionPool::mysql(&config.database)?);
//! let server = Arc::new(McpServer::new(pool));
//!
//! HttpServer::new(config.server, server).run().await?;
//! ```

pub mod admission;
pub mod error;
pub mod pool;
pub mod protocol;
pub mod server;
pub mod session;
pub mod tools;
pub mod transport;

// Re-export main types
pub use admission::{Classification, classify};
pub use error::{DriverError, McpError};
pub use pool::{ExecutionPool, MySqlBackend, QueryBackend, QueryResult};
pub use protocol::{
    CallToolParams, CallToolResponse, JsonRpcRequest, JsonRpcResponse, ToolContent,
    ToolDefinition,
};
pub use server::McpServer;
pub use session::{SessionHandle, SessionRegistry};
pub use tools::ToolRegistry;
pub use transport::{HttpServer, TransportState, create_router};
