//! Database endpoint configuration types.
//!
//! This module defines configuration for the MySQL endpoint the gateway reads
//! from, and the policy of the connection pool in front of it.
//! The password may be given directly or through an environment variable
//! (`password_env`), which takes precedence.

use serde::{Deserialize, Serialize};

/// Configuration for the MySQL connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Hostname of the MySQL server.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port of the MySQL server.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Username for the connection.
    #[serde(default = "default_username")]
    pub username: String,

    /// Password for the connection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Environment variable containing the password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,

    /// Default schema selected on connect.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    /// Connection pool configuration.
    #[serde(default)]
    pub pool: PoolConfig,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            username: default_username(),
            password: None,
            password_env: None,
            database: None,
            pool: PoolConfig::default(),
        }
    }
}

/// Connection pool policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Maximum number of connections checked out at once.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Timeout in seconds for opening a connection to the server.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,

    /// How long a connection can remain idle before being closed.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u64,

    /// Whether idle connections are pinged before reuse.
    #[serde(default = "default_keep_alive")]
    pub keep_alive: bool,

    /// Minimum connection age before keep-alive probes apply.
    #[serde(default = "default_keep_alive_initial_delay")]
    pub keep_alive_initial_delay_seconds: u64,

    /// Idle time after which a connection is pinged before reuse. Must be
    /// below `idle_timeout_seconds`.
    #[serde(default = "default_keep_alive_interval")]
    pub keep_alive_interval_seconds: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            connect_timeout_seconds: default_connect_timeout(),
            idle_timeout_seconds: default_idle_timeout(),
            keep_alive: default_keep_alive(),
            keep_alive_initial_delay_seconds: default_keep_alive_initial_delay(),
            keep_alive_interval_seconds: default_keep_alive_interval(),
        }
    }
}

fn default_max_connections() -> u32 {
    30
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_idle_timeout() -> u64 {
    60
}

fn default_keep_alive() -> bool {
    true
}

fn default_keep_alive_initial_delay() -> u64 {
    10
}

fn default_keep_alive_interval() -> u64 {
    30
}

impl DatabaseConfig {
    /// Build a MySQL connection URL from this configuration.
    pub fn connection_string(&self) -> String {
        self.render_url(self.get_password().as_deref())
    }

    /// Same as [`connection_string`](Self::connection_string) with the password masked.
    pub fn redacted_connection_string(&self) -> String {
        let masked = self.get_password().map(|_| "****");
        self.render_url(masked)
    }

    fn render_url(&self, password: Option<&str>) -> String {
        let credentials = match password {
            Some(password) => format!("{}:{}", self.username, password),
            None => self.username.clone(),
        };
        match &self.database {
            Some(database) => format!(
                "mysql://{}@{}:{}/{}",
                credentials, self.host, self.port, database
            ),
            None => format!("mysql://{}@{}:{}", credentials, self.host, self.port),
        }
    }

    /// Get the password, checking password_env first.
    pub fn get_password(&self) -> Option<String> {
        if let Some(env_var) = &self.password_env
            && let Ok(password) = std::env::var(env_var)
        {
            return Some(password);
        }
        self.password.clone()
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    3306
}

fn default_username() -> String {
    "root".to_string()
}
