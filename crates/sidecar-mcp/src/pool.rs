//! Query execution pool.
//!
//! This module owns the bounded set of database connections the gateway uses:
//! - A FIFO semaphore sized to `max_connections` that callers queue on
//!   without limit when the pool is saturated
//! - A [`QueryBackend`] seam that runs one statement and returns its rows
//! - The MySQL backend built on `sqlx`, with idle reaping and keep-alive probes
//! - Conversion of driver failures into a failed [`QueryResult`]
//!
//! A statement's permit and its connection are both scoped guards, so they go
//! back to the pool on every exit path, including errors, panics inside the
//! backend, and a caller that drops the future mid-statement.
//!
//! Keep-alive probes run when an idle connection is checked out, never on a
//! timer. A probe never hands a connection back to the pool, so the idle
//! clock the reaper reads keeps running.

use crate::error::{DriverError, McpError};
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use futures::FutureExt;
use serde_json::{Value, json};
use sidecar_core::config::{DatabaseConfig, PoolConfig};
use sqlx::mysql::{MySqlColumn, MySqlConnectOptions, MySqlPoolOptions, MySqlRow};
use sqlx::{Column, Connection, MySqlPool, Row, TypeInfo, ValueRef};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Outcome of executing one statement.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    /// Rows returned by the database, one JSON object per row.
    Rows(Vec<Value>),
    /// The statement failed; the message is shown to the agent.
    Failed(String),
}

impl QueryResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, QueryResult::Rows(_))
    }
}

/// Something that can run a single statement against a database.
#[async_trait]
pub trait QueryBackend: Send + Sync {
    /// Run `sql` exactly as given and return its rows.
    async fn fetch_rows(&self, sql: &str) -> Result<Vec<Value>, DriverError>;
}

/// Bounded, queued access to a [`QueryBackend`].
pub struct ExecutionPool {
    backend: Arc<dyn QueryBackend>,
    permits: Semaphore,
    max_connections: usize,
}

impl ExecutionPool {
    /// Create a pool that lets at most `max_connections` statements run at once.
    pub fn new(backend: Arc<dyn QueryBackend>, max_connections: usize) -> Result<Self, McpError> {
        if max_connections == 0 {
            return Err(McpError::PoolMisconfigured(
                "max_connections must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            backend,
            permits: Semaphore::new(max_connections),
            max_connections,
        })
    }

    /// Create a pool backed by MySQL.
    ///
    /// No connection is opened here; the first statement does that. Must be
    /// called from within a Tokio runtime.
    pub fn mysql(config: &DatabaseConfig) -> Result<Self, McpError> {
        let backend = MySqlBackend::connect_lazy(config);
        let pool = Self::new(Arc::new(backend), config.pool.max_connections as usize)?;

        tracing::info!(
            endpoint = %config.redacted_connection_string(),
            max_connections = config.pool.max_connections,
            keep_alive = config.pool.keep_alive,
            "Created MySQL execution pool"
        );
        Ok(pool)
    }

    /// Execute a statement, waiting for a free connection if necessary.
    ///
    /// Never fails: driver errors come back as [`QueryResult::Failed`].
    pub async fn execute(&self, sql: &str) -> QueryResult {
        let _permit = match self.permits.acquire().await {
            Ok(permit) => permit,
            Err(_) => return QueryResult::Failed("execution pool is closed".to_string()),
        };

        let outcome = AssertUnwindSafe(self.backend.fetch_rows(sql))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(rows)) => {
                tracing::debug!(rows = rows.len(), "Query completed");
                QueryResult::Rows(rows)
            }
            Ok(Err(e)) => {
                let message = e.message();
                tracing::warn!(error = %message, "Query failed");
                QueryResult::Failed(message)
            }
            Err(_) => {
                tracing::error!("Query backend panicked");
                QueryResult::Failed("query backend failed unexpectedly".to_string())
            }
        }
    }

    /// Number of statements currently holding a connection.
    pub fn in_use(&self) -> usize {
        self.max_connections - self.permits.available_permits()
    }

    /// Upper bound on concurrently executing statements.
    pub fn max_connections(&self) -> usize {
        self.max_connections
    }
}

/// When an idle connection gets a liveness probe before reuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepAlivePolicy {
    /// Connections younger than this are never probed.
    pub initial_delay: Duration,
    /// Idle time after which a connection is probed before reuse.
    pub interval: Duration,
}

impl KeepAlivePolicy {
    /// Policy from the pool configuration, or `None` when keep-alive is off.
    pub fn from_config(config: &PoolConfig) -> Option<Self> {
        config.keep_alive.then(|| Self {
            initial_delay: Duration::from_secs(config.keep_alive_initial_delay_seconds),
            interval: Duration::from_secs(config.keep_alive_interval_seconds),
        })
    }

    /// Whether a connection of this `age`, idle for `idle_for`, needs a ping.
    pub fn is_due(&self, age: Duration, idle_for: Duration) -> bool {
        age >= self.initial_delay && idle_for >= self.interval
    }
}

/// [`QueryBackend`] over a `sqlx` MySQL pool.
#[derive(Clone)]
pub struct MySqlBackend {
    pool: MySqlPool,
}

impl MySqlBackend {
    /// Build the `sqlx` pool without connecting.
    pub fn connect_lazy(config: &DatabaseConfig) -> Self {
        let mut options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.username);
        if let Some(password) = config.get_password() {
            options = options.password(&password);
        }
        if let Some(database) = &config.database {
            options = options.database(database);
        }

        // acquire_timeout bounds opening a connection; waiting for a free one
        // is handled by the ExecutionPool semaphore.
        let mut pool_options = MySqlPoolOptions::new()
            .max_connections(config.pool.max_connections)
            .min_connections(0)
            .acquire_timeout(Duration::from_secs(config.pool.connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.pool.idle_timeout_seconds))
            .test_before_acquire(false);

        if let Some(policy) = KeepAlivePolicy::from_config(&config.pool) {
            // A failed probe closes the connection and sqlx moves on to
            // another idle one, or opens a fresh one.
            pool_options = pool_options.before_acquire(move |conn, meta| {
                Box::pin(async move {
                    if policy.is_due(meta.age, meta.idle_for) {
                        if let Err(e) = conn.ping().await {
                            tracing::warn!(
                                error = %e,
                                "Keep-alive probe failed, discarding connection"
                            );
                            return Err(e);
                        }
                        tracing::debug!(idle_for = ?meta.idle_for, "Keep-alive probe succeeded");
                    }
                    Ok(true)
                })
            });
        }

        Self {
            pool: pool_options.connect_lazy_with(options),
        }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

#[async_trait]
impl QueryBackend for MySqlBackend {
    async fn fetch_rows(&self, sql: &str) -> Result<Vec<Value>, DriverError> {
        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query(sql).fetch_all(&mut *conn).await?;
        Ok(rows.iter().map(row_to_json).collect())
    }
}

/// Convert a MySQL row to a JSON object keyed by column name.
fn row_to_json(row: &MySqlRow) -> Value {
    columns_to_object(
        row.columns()
            .iter()
            .map(|col| (col.name().to_string(), column_to_json(row, col))),
    )
}

/// Build a JSON object whose keys keep the column order of the result set.
fn columns_to_object(columns: impl IntoIterator<Item = (String, Value)>) -> Value {
    Value::Object(columns.into_iter().collect())
}

fn column_to_json(row: &MySqlRow, col: &MySqlColumn) -> Value {
    let index = col.ordinal();
    match row.try_get_raw(index) {
        Ok(raw) if !raw.is_null() => {}
        _ => return Value::Null,
    }

    if col.type_info().name() == "JSON"
        && let Ok(v) = row.try_get::<Value, _>(index)
    {
        return v;
    }

    // Try the decodable types in turn and fall back to null.
    if let Ok(v) = row.try_get::<i64, _>(index) {
        json!(v)
    } else if let Ok(v) = row.try_get::<u64, _>(index) {
        json!(v)
    } else if let Ok(v) = row.try_get::<f64, _>(index) {
        json!(v)
    } else if let Ok(v) = row.try_get::<f32, _>(index) {
        json!(v)
    } else if let Ok(v) = row.try_get::<BigDecimal, _>(index) {
        json!(v.to_string())
    } else if let Ok(v) = row.try_get::<String, _>(index) {
        json!(v)
    } else if let Ok(v) = row.try_get::<NaiveDateTime, _>(index) {
        json!(v.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
    } else if let Ok(v) = row.try_get::<DateTime<Utc>, _>(index) {
        json!(v.to_rfc3339())
    } else if let Ok(v) = row.try_get::<NaiveDate, _>(index) {
        json!(v.to_string())
    } else if let Ok(v) = row.try_get::<NaiveTime, _>(index) {
        json!(v.to_string())
    } else if let Ok(v) = row.try_get::<Vec<u8>, _>(index) {
        json!(String::from_utf8_lossy(&v))
    } else {
        tracing::debug!(column = col.name(), "Unsupported column type, returning null");
        Value::Null
    }
}
