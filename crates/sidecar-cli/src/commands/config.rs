//! Configuration flags shared by the commands that talk to MySQL.
//!
//! Values are layered: built-in defaults, then the YAML file, then any flag
//! or environment variable that was actually given.

use anyhow::{Context, Result};
use clap::Args;
use sidecar_core::SidecarConfig;
use std::path::PathBuf;
use tracing::warn;

/// Database connection flags.
#[derive(Debug, Clone, Default, Args)]
pub struct DatabaseArgs {
    /// Configuration file path.
    #[arg(short, long, default_value = "sidecar.yaml")]
    pub config: PathBuf,

    /// MySQL host.
    #[arg(long = "db-host", env = "DB_HOST")]
    pub db_host: Option<String>,

    /// MySQL port.
    #[arg(long = "db-port", env = "DB_PORT")]
    pub db_port: Option<u16>,

    /// MySQL user.
    #[arg(long = "db-user", env = "DB_USER")]
    pub db_user: Option<String>,

    /// MySQL password.
    #[arg(long = "db-password", env = "DB_PASSWORD", hide_env_values = true)]
    pub db_password: Option<String>,

    /// Database (schema) to select on connect.
    #[arg(long = "db-name", env = "DB_NAME")]
    pub db_name: Option<String>,

    /// Upper bound on concurrently executing statements.
    #[arg(long = "max-connections", env = "SIDECAR_MAX_CONNECTIONS")]
    pub max_connections: Option<u32>,
}

impl DatabaseArgs {
    /// Load the config file (if present) and apply flag overrides.
    pub fn load(&self) -> Result<SidecarConfig> {
        let mut config = if self.config.exists() {
            SidecarConfig::from_file(&self.config)
                .with_context(|| format!("Failed to load config file: {:?}", self.config))?
        } else {
            warn!(config = %self.config.display(), "Config file not found, using defaults");
            SidecarConfig::default()
        };
        self.apply(&mut config);
        Ok(config)
    }

    /// Overwrite config values with the flags that were given.
    pub fn apply(&self, config: &mut SidecarConfig) {
        let db = &mut config.database;
        if let Some(host) = &self.db_host {
            db.host = host.clone();
        }
        if let Some(port) = self.db_port {
            db.port = port;
        }
        if let Some(user) = &self.db_user {
            db.username = user.clone();
        }
        if let Some(password) = &self.db_password {
            // An explicit password wins over a configured password_env.
            db.password = Some(password.clone());
            db.password_env = None;
        }
        if let Some(name) = &self.db_name {
            db.database = Some(name.clone());
        }
        if let Some(max) = self.max_connections {
            db.pool.max_connections = max;
        }
    }
}
