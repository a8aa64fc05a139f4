//! Configuration types for the MySQL MCP sidecar.
//!
//! Configuration is loaded from an optional YAML file (`sidecar.yaml`) and
//! then overridden field by field from the environment / command line by the
//! binary. Every field has a default, so an empty file is a valid
//! configuration.
//!
//! ```yaml
//! server:
//!   port: 3002
//! database:
//!   host: db.internal
//!   username: reader
//!   password_env: DB_PASSWORD
//!   database: sales
//!   pool:
//!     max_connections: 30
//! ```

pub mod database;
pub mod server;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub use database::{DatabaseConfig, PoolConfig};
pub use server::ServerConfig;

/// Complete sidecar configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SidecarConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// MySQL endpoint and pool policy.
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SidecarConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }

    /// Reject configurations the gateway cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.pool.max_connections == 0 {
            return Err(ConfigError::Config(
                "database.pool.max_connections must be at least 1".to_string(),
            ));
        }
        let pool = &self.database.pool;
        if pool.keep_alive && pool.keep_alive_interval_seconds >= pool.idle_timeout_seconds {
            return Err(ConfigError::Config(format!(
                "database.pool.keep_alive_interval_seconds ({}) must be below idle_timeout_seconds ({})",
                pool.keep_alive_interval_seconds, pool.idle_timeout_seconds
            )));
        }
        if self.server.port == 0 {
            return Err(ConfigError::Config("server.port must not be 0".to_string()));
        }
        for (field, path) in [
            ("server.sse_path", &self.server.sse_path),
            ("server.messages_path", &self.server.messages_path),
        ] {
            if !path.starts_with('/') {
                return Err(ConfigError::Config(format!(
                    "{} must start with '/', got {:?}",
                    field, path
                )));
            }
        }
        if self.server.sse_path == self.server.messages_path {
            return Err(ConfigError::Config(
                "server.sse_path and server.messages_path must differ".to_string(),
            ));
        }
        Ok(())
    }
}
