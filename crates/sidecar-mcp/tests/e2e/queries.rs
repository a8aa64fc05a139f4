//! Admitted statements against a real MySQL server.
//!
//! Covers:
//! - rows returned verbatim as pretty JSON, keys in SELECT order
//! - column type conversion (DECIMAL, DATETIME, JSON, NULL)
//! - SHOW / DESCRIBE / WITH / EXPLAIN reach the database
//! - the original text (comments included) is what gets executed
//! - driver errors come back as an error payload

use super::common::*;
use serde_json::json;

// =============================================================================
// ROWS
// =============================================================================

pub async fn test_select_literal(ctx: &TestContext) {
    println!("  🧪 test_select_literal");

    let server = ctx.server();
    let response = query(&server, "SELECT 1").await;

    assert_eq!(rows(&response), json!([{ "1": 1 }]));
    assert_eq!(text(&response), "[\n  {\n    \"1\": 1\n  }\n]");

    println!("     ✓ SELECT 1 returns one row");
}

pub async fn test_select_converts_column_types(ctx: &TestContext) {
    println!("  🧪 test_select_converts_column_types");

    let server = ctx.server();
    let response = query(
        &server,
        "SELECT id, name, email, balance, signed_up, attributes FROM customers ORDER BY id",
    )
    .await;

    assert_eq!(
        rows(&response),
        json!([
            {
                "id": 1,
                "name": "Ada Lovelace",
                "email": "ada@example.com",
                "balance": "1500.50",
                "signed_up": "2024-01-15T10:30:00",
                "attributes": { "tier": "gold" }
            },
            {
                "id": 2,
                "name": "Alan Turing",
                "email": null,
                "balance": "0.00",
                "signed_up": "2024-03-02T08:00:00",
                "attributes": null
            }
        ])
    );

    println!("     ✓ DECIMAL, DATETIME, JSON and NULL columns convert");
}

pub async fn test_columns_keep_select_order(ctx: &TestContext) {
    println!("  🧪 test_columns_keep_select_order");

    let server = ctx.server();
    let response = query(&server, "SELECT name, id FROM customers WHERE id = 1").await;

    assert_eq!(response.is_error, Some(false));
    assert_eq!(
        text(&response),
        "[\n  {\n    \"name\": \"Ada Lovelace\",\n    \"id\": 1\n  }\n]"
    );

    println!("     ✓ Row keys follow the SELECT list");
}

pub async fn test_empty_result(ctx: &TestContext) {
    println!("  🧪 test_empty_result");

    let server = ctx.server();
    let response = query(&server, "SELECT id FROM customers WHERE id = 999").await;

    assert_eq!(rows(&response), json!([]));

    println!("     ✓ No matching rows yields an empty array");
}

// =============================================================================
// OTHER READ VERBS
// =============================================================================

pub async fn test_show_tables(ctx: &TestContext) {
    println!("  🧪 test_show_tables");

    let server = ctx.server();
    let response = query(&server, "SHOW TABLES").await;

    let tables = rows(&response);
    let names: Vec<String> = tables
        .as_array()
        .expect("array of rows")
        .iter()
        .filter_map(|row| row.as_object()?.values().next()?.as_str().map(String::from))
        .collect();
    assert!(names.contains(&"customers".to_string()), "{:?}", names);
    assert!(names.contains(&"audit_log".to_string()), "{:?}", names);

    println!("     ✓ SHOW TABLES lists seeded tables");
}

pub async fn test_describe_table(ctx: &TestContext) {
    println!("  🧪 test_describe_table");

    let server = ctx.server();
    let response = query(&server, "DESCRIBE customers").await;

    let columns = rows(&response);
    assert_eq!(columns.as_array().map(Vec::len), Some(6));
    assert_eq!(columns[0]["Field"], json!("id"));

    println!("     ✓ DESCRIBE returns one row per column");
}

pub async fn test_with_and_explain(ctx: &TestContext) {
    println!("  🧪 test_with_and_explain");

    let server = ctx.server();

    let response = query(
        &server,
        "WITH rich AS (SELECT id FROM customers WHERE balance > 100) SELECT COUNT(*) AS n FROM rich",
    )
    .await;
    assert_eq!(rows(&response), json!([{ "n": 1 }]));

    let response = query(&server, "EXPLAIN SELECT * FROM customers").await;
    assert!(!rows(&response).as_array().expect("rows").is_empty());

    println!("     ✓ WITH and EXPLAIN are executed");
}

pub async fn test_leading_comment_executes_original(ctx: &TestContext) {
    println!("  🧪 test_leading_comment_executes_original");

    let server = ctx.server();
    let response = query(
        &server,
        "/* report */ -- daily\n  select name FROM customers WHERE id = 1",
    )
    .await;

    assert_eq!(rows(&response), json!([{ "name": "Ada Lovelace" }]));

    println!("     ✓ Commented statement is admitted and runs as sent");
}

// =============================================================================
// DRIVER ERRORS
// =============================================================================

pub async fn test_missing_table_is_error_payload(ctx: &TestContext) {
    println!("  🧪 test_missing_table_is_error_payload");

    let server = ctx.server();
    let response = query(&server, "SELECT * FROM missing_table").await;

    assert_eq!(response.is_error, Some(true));
    let message = text(&response);
    assert!(message.starts_with("MySQL error: "), "{}", message);
    assert!(message.contains("missing_table"), "{}", message);
    assert!(message.contains("doesn't exist"), "{}", message);

    println!("     ✓ Unknown table is reported in the result payload");
}

pub async fn test_syntax_error_is_error_payload(ctx: &TestContext) {
    println!("  🧪 test_syntax_error_is_error_payload");

    let server = ctx.server();
    let response = query(&server, "SELECT FROM WHERE").await;

    assert_eq!(response.is_error, Some(true));
    assert!(text(&response).starts_with("MySQL error: "));

    // The pool keeps serving after a failure.
    let response = query(&server, "SELECT 1").await;
    assert_eq!(rows(&response), json!([{ "1": 1 }]));

    println!("     ✓ Syntax error does not poison the pool");
}

// =============================================================================
// TEST RUNNER
// =============================================================================

pub async fn run_all_tests(ctx: &TestContext) {
    println!("\n📦 Running query tests...\n");

    test_select_literal(ctx).await;
    test_select_converts_column_types(ctx).await;
    test_columns_keep_select_order(ctx).await;
    test_empty_result(ctx).await;

    test_show_tables(ctx).await;
    test_describe_table(ctx).await;
    test_with_and_explain(ctx).await;
    test_leading_comment_executes_original(ctx).await;

    test_missing_table_is_error_payload(ctx).await;
    test_syntax_error_is_error_payload(ctx).await;

    println!("\n✅ All query tests passed!\n");
}
