//! `sidecar serve` command implementation.
//!
//! Loads configuration, builds the execution pool and MCP server, and runs the
//! SSE transport until Ctrl+C or SIGTERM.

use super::config::DatabaseArgs;
use anyhow::{Context, Result};
use clap::Args;
use sidecar_core::SidecarConfig;
use sidecar_mcp::{ExecutionPool, HttpServer, McpServer};
use std::sync::Arc;
use tracing::info;

/// Arguments for `sidecar serve`.
#[derive(Debug, Clone, Default, Args)]
pub struct ServeArgs {
    #[command(flatten)]
    pub database: DatabaseArgs,

    /// Address to listen on. Overrides config file.
    #[arg(long, env = "SIDECAR_HOST")]
    pub host: Option<String>,

    /// Port to listen on. Overrides config file.
    #[arg(long, env = "SIDECAR_PORT")]
    pub port: Option<u16>,
}

impl ServeArgs {
    /// Resolve the full configuration for the gateway.
    pub fn load(&self) -> Result<SidecarConfig> {
        let mut config = self.database.load()?;
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

/// Execute the serve command.
pub async fn execute(args: ServeArgs) -> Result<()> {
    let config = args.load()?;

    info!(
        database = %config.database.redacted_connection_string(),
        max_connections = config.database.pool.max_connections,
        listen = %config.server.bind_address(),
        "Starting sidecar"
    );

    let pool = ExecutionPool::mysql(&config.database).context("Failed to create execution pool")?;
    let server = Arc::new(McpServer::new(Arc::new(pool)));

    info!(
        tool_count = server.tools().len(),
        max_connections = server.pool().max_connections(),
        "MCP server ready"
    );

    HttpServer::new(config.server, server)
        .run()
        .await
        .context("Sidecar server failed")?;

    info!("Sidecar stopped");
    Ok(())
}
