// Configuration types shared across all sidecar crates
pub mod config;

// Re-export commonly used config types for convenience
pub use config::{ConfigError, DatabaseConfig, PoolConfig, ServerConfig, SidecarConfig};
