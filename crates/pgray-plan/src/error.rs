//! Error types for plan parsing

use thiserror::Error;

/// Errors that can occur while turning EXPLAIN output into a plan graph
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Invalid JSON: Could not find 'Plan' property")]
    MissingPlan,

    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

/// Result type alias for plan operations
pub type Result<T> = std::result::Result<T, PlanError>;
