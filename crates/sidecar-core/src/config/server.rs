//! HTTP listener configuration.
//!
//! Controls where the gateway listens and how the SSE session endpoints are
//! laid out.

use serde::{Deserialize, Serialize};

/// Configuration for the HTTP side of the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Listen port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path of the long-lived SSE endpoint that opens a session.
    #[serde(default = "default_sse_path")]
    pub sse_path: String,

    /// Path that receives client-to-server messages (`?sessionId=<id>`).
    #[serde(default = "default_messages_path")]
    pub messages_path: String,

    /// Largest request body accepted on the messages endpoint.
    #[serde(default = "default_max_message_bytes")]
    pub max_message_bytes: usize,

    /// Interval between SSE keep-alive comments.
    #[serde(default = "default_sse_keep_alive")]
    pub sse_keep_alive_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            sse_path: default_sse_path(),
            messages_path: default_messages_path(),
            max_message_bytes: default_max_message_bytes(),
            sse_keep_alive_seconds: default_sse_keep_alive(),
        }
    }
}

impl ServerConfig {
    /// Socket address string the listener binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3002
}

fn default_sse_path() -> String {
    "/sse".to_string()
}

fn default_messages_path() -> String {
    "/messages".to_string()
}

fn default_max_message_bytes() -> usize {
    4 * 1024 * 1024
}

fn default_sse_keep_alive() -> u64 {
    30
}
