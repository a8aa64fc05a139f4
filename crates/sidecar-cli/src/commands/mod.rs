//! CLI command implementations for the sidecar binary.

pub mod check;
pub mod classify;
pub mod config;
pub mod serve;
