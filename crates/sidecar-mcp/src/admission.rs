//! Query admission gate.
//!
//! A lexical classifier that decides whether a SQL statement may be sent to
//! the database. Comments are stripped, the remainder is trimmed and
//! upper-cased, and the statement is admitted only when it starts with one of
//! the read-only verbs in [`READ_ONLY_KEYWORDS`].
//!
//! The normalized text is used for classification only. Callers execute the
//! original statement.
//!
//! This is not a SQL parser. It does not see through statements that start
//! with a read verb and still have side effects (for example a `SELECT`
//! calling a function that writes), and it does not split multi-statement
//! payloads.

use regex::Regex;
use std::sync::LazyLock;

/// Leading keywords of statements the gate admits.
pub const READ_ONLY_KEYWORDS: &[&str] = &["SELECT", "DESCRIBE", "DESC", "SHOW", "EXPLAIN", "WITH"];

/// Explanation returned for every rejected statement.
pub const REJECTION_REASON: &str = "SECURITY: the sidecar blocked this query. Only read operations are allowed (SELECT/DESCRIBE/SHOW/WITH/EXPLAIN).";

// Block comments are matched lazily across lines; line comments run to the end of their line.
static COMMENTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mR)/\*[\s\S]*?\*/|--.*$").expect("comment pattern is valid")
});

/// Outcome of classifying one statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The statement may be executed.
    Admitted,
    /// The statement must not reach the database.
    Rejected { reason: String },
}

impl Classification {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Classification::Admitted)
    }

    /// Rejection reason, if any.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Classification::Admitted => None,
            Classification::Rejected { reason } => Some(reason),
        }
    }
}

/// Copy of `sql` used for inspection: comments removed, trimmed, upper-cased.
pub fn normalize(sql: &str) -> String {
    COMMENTS.replace_all(sql, "").trim().to_uppercase()
}

/// Classify a statement as admitted or rejected.
pub fn classify(sql: &str) -> Classification {
    let normalized = normalize(sql);
    if READ_ONLY_KEYWORDS
        .iter()
        .any(|keyword| normalized.starts_with(keyword))
    {
        Classification::Admitted
    } else {
        Classification::Rejected {
            reason: REJECTION_REASON.to_string(),
        }
    }
}
