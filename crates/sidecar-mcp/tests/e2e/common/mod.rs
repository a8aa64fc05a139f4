//! Shared test infrastructure for sidecar end-to-end tests.
//!
//! This module provides:
//! - Docker container management for MySQL
//! - Schema and seed data
//! - Helpers to build a server over the container and call the `query` tool

use serde_json::{Value, json};
use sidecar_core::config::{DatabaseConfig, PoolConfig};
use sidecar_mcp::protocol::{CallToolParams, CallToolResponse, ToolContent};
use sidecar_mcp::{ExecutionPool, McpServer};
use sqlx::MySqlPool;
use sqlx::mysql::MySqlConnectOptions;
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// DOCKER CONTAINER CONFIGURATION
// =============================================================================

pub const CONTAINER_NAME: &str = "sidecar_test_mysql";
pub const MYSQL_PORT: u16 = 3307;
pub const MYSQL_PASSWORD: &str = "sidecar_test_password";
pub const DATABASE_NAME: &str = "sidecar_test";

pub fn database_config(max_connections: u32) -> DatabaseConfig {
    DatabaseConfig {
        host: "127.0.0.1".to_string(),
        port: MYSQL_PORT,
        username: "root".to_string(),
        password: Some(MYSQL_PASSWORD.to_string()),
        database: Some(DATABASE_NAME.to_string()),
        pool: PoolConfig {
            max_connections,
            keep_alive: false,
            ..Default::default()
        },
        ..Default::default()
    }
}

// =============================================================================
// DOCKER CONTAINER MANAGEMENT
// =============================================================================

/// Start a MySQL container for testing
pub fn start_mysql_container() -> Result<(), String> {
    let _ = Command::new("docker")
        .args(["rm", "-f", CONTAINER_NAME])
        .output();

    let status = Command::new("docker")
        .args([
            "run",
            "-d",
            "--name",
            CONTAINER_NAME,
            "-e",
            &format!("MYSQL_ROOT_PASSWORD={}", MYSQL_PASSWORD),
            "-e",
            &format!("MYSQL_DATABASE={}", DATABASE_NAME),
            "-p",
            &format!("{}:3306", MYSQL_PORT),
            "mysql:8",
        ])
        .status()
        .map_err(|e| format!("Failed to start container: {}", e))?;

    if !status.success() {
        return Err("Failed to start MySQL container".to_string());
    }

    Ok(())
}

/// Stop and remove the MySQL container
pub fn stop_mysql_container() {
    let _ = Command::new("docker")
        .args(["rm", "-f", CONTAINER_NAME])
        .output();
}

/// Wait for MySQL to accept connections
pub async fn wait_for_mysql() -> Result<MySqlPool, String> {
    let options = MySqlConnectOptions::new()
        .host("127.0.0.1")
        .port(MYSQL_PORT)
        .username("root")
        .password(MYSQL_PASSWORD)
        .database(DATABASE_NAME);

    for attempt in 1..=90 {
        if let Ok(pool) = MySqlPool::connect_with(options.clone()).await
            && sqlx::query("SELECT 1").fetch_one(&pool).await.is_ok()
        {
            println!("✅ MySQL ready after {} attempts", attempt);
            return Ok(pool);
        }
        if attempt % 10 == 0 {
            println!("⏳ Waiting for MySQL... (attempt {})", attempt);
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
    Err("MySQL did not become ready in time".to_string())
}

// =============================================================================
// DATABASE INITIALIZATION
// =============================================================================

const SCHEMA_SQL: &[&str] = &[
    "CREATE TABLE customers (
        id INT PRIMARY KEY,
        name VARCHAR(100) NOT NULL,
        email VARCHAR(200),
        balance DECIMAL(10, 2) NOT NULL,
        signed_up DATETIME NOT NULL,
        attributes JSON
    )",
    "CREATE TABLE audit_log (
        id INT AUTO_INCREMENT PRIMARY KEY,
        note VARCHAR(200) NOT NULL
    )",
];

const SEED_SQL: &[&str] = &[
    "INSERT INTO customers VALUES
        (1, 'Ada Lovelace', 'ada@example.com', 1500.50, '2024-01-15 10:30:00', '{\"tier\": \"gold\"}'),
        (2, 'Alan Turing', NULL, 0.00, '2024-03-02 08:00:00', NULL)",
    "INSERT INTO audit_log (note) VALUES ('seeded')",
];

pub async fn initialize_database(pool: &MySqlPool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA_SQL.iter().chain(SEED_SQL) {
        sqlx::raw_sql(statement).execute(pool).await?;
    }
    println!("✅ Database initialized with schema and seed data");
    Ok(())
}

// =============================================================================
// TEST CONTEXT
// =============================================================================

pub struct TestContext {
    /// Direct connection used for setup and verification, bypassing the gateway.
    pub admin: MySqlPool,
}

impl TestContext {
    pub async fn setup() -> Result<Self, String> {
        start_mysql_container()?;
        let admin = wait_for_mysql().await?;
        initialize_database(&admin)
            .await
            .map_err(|e| format!("Failed to initialize database: {}", e))?;
        Ok(Self { admin })
    }

    /// Execution pool over the container.
    pub fn pool(&self, max_connections: u32) -> Arc<ExecutionPool> {
        Arc::new(
            ExecutionPool::mysql(&database_config(max_connections))
                .expect("pool configuration is valid"),
        )
    }

    /// MCP server over the container.
    pub fn server(&self) -> McpServer {
        McpServer::new(self.pool(4))
    }

    /// Number of rows in `audit_log`, read directly.
    pub async fn audit_log_rows(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM audit_log")
            .fetch_one(&self.admin)
            .await
            .expect("count audit_log")
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        stop_mysql_container();
        println!("🧹 Cleaned up MySQL container");
    }
}

// =============================================================================
// RESULT HELPERS
// =============================================================================

/// Call the `query` tool with `sql`.
pub async fn query(server: &McpServer, sql: &str) -> CallToolResponse {
    server
        .call_tool(CallToolParams {
            name: "query".to_string(),
            arguments: json!({ "sql": sql }),
        })
        .await
        .expect("query tool call should not be a usage error")
}

/// Text of the first content item.
pub fn text(response: &CallToolResponse) -> &str {
    match response.content.first() {
        Some(ToolContent::Text { text }) => text,
        None => panic!("response has no content"),
    }
}

/// Parse the rows out of a successful response.
pub fn rows(response: &CallToolResponse) -> Value {
    assert_eq!(response.is_error, Some(false), "expected success: {:?}", response);
    serde_json::from_str(text(response)).expect("rows are JSON")
}
