//! `sidecar check` command implementation.
//!
//! Opens one connection with the resolved database settings and runs
//! `SELECT 1` through the execution pool.

use super::config::DatabaseArgs;
use anyhow::{Context, Result, bail};
use sidecar_mcp::{ExecutionPool, QueryResult};

/// Execute the check command.
pub async fn execute(args: DatabaseArgs) -> Result<()> {
    let mut config = args.load()?;
    config.database.pool.max_connections = 1;
    config.database.pool.keep_alive = false;

    let endpoint = config.database.redacted_connection_string();
    println!("🔍 Checking {}", endpoint);

    let pool = ExecutionPool::mysql(&config.database).context("Failed to create execution pool")?;

    match pool.execute("SELECT 1").await {
        QueryResult::Rows(_) => {
            println!("✅ Connected, SELECT 1 succeeded");
            Ok(())
        }
        QueryResult::Failed(message) => {
            println!("❌ MySQL error: {}", message);
            bail!("Database check failed for {}", endpoint)
        }
    }
}
