//! Execution pool behaviour with real connections.

use super::common::*;
use futures::future::join_all;
use sidecar_mcp::QueryResult;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub async fn test_more_callers_than_connections(ctx: &TestContext) {
    println!("  🧪 test_more_callers_than_connections");

    let pool = ctx.pool(2);
    let started = Instant::now();

    let results = join_all((0..6).map(|_| {
        let pool = Arc::clone(&pool);
        async move { pool.execute("SELECT SLEEP(0.2) AS slept").await }
    }))
    .await;

    assert!(results.iter().all(QueryResult::is_ok), "{:?}", results);
    // Six 200ms statements over two connections need at least three rounds.
    assert!(started.elapsed() >= Duration::from_millis(550));
    assert_eq!(pool.in_use(), 0);

    println!("     ✓ Six callers over two connections all complete");
}

pub async fn test_failures_release_connections(ctx: &TestContext) {
    println!("  🧪 test_failures_release_connections");

    let pool = ctx.pool(1);

    for _ in 0..3 {
        let result = pool.execute("SELECT * FROM missing_table").await;
        assert!(!result.is_ok());
    }
    assert_eq!(pool.in_use(), 0);

    let result = pool.execute("SELECT 1").await;
    assert!(result.is_ok(), "{:?}", result);

    println!("     ✓ A single connection survives repeated failures");
}

pub async fn test_cancelled_caller_releases_connection(ctx: &TestContext) {
    println!("  🧪 test_cancelled_caller_releases_connection");

    let pool = ctx.pool(1);

    let slow = tokio::time::timeout(Duration::from_millis(100), pool.execute("SELECT SLEEP(2)"))
        .await;
    assert!(slow.is_err(), "statement should have been cancelled");
    assert_eq!(pool.in_use(), 0);

    let result = tokio::time::timeout(Duration::from_secs(10), pool.execute("SELECT 1"))
        .await
        .expect("pool should not stay saturated");
    assert!(result.is_ok(), "{:?}", result);

    println!("     ✓ Dropping a caller frees its slot");
}

// =============================================================================
// TEST RUNNER
// =============================================================================

pub async fn run_all_tests(ctx: &TestContext) {
    println!("\n📦 Running pool tests...\n");

    test_more_callers_than_connections(ctx).await;
    test_failures_release_connections(ctx).await;
    test_cancelled_caller_releases_connection(ctx).await;

    println!("\n✅ All pool tests passed!\n");
}
