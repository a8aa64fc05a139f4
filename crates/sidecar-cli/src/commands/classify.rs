//! `sidecar classify` command implementation.

use sidecar_mcp::{Classification, classify};

/// Render the admission decision for `sql`.
pub fn describe(sql: &str) -> String {
    match classify(sql) {
        Classification::Admitted => "admitted".to_string(),
        Classification::Rejected { reason } => format!("rejected: {}", reason),
    }
}

/// Execute the classify command.
pub fn execute(sql: &str) {
    println!("{}", describe(sql));
}
