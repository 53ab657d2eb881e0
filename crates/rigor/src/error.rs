//! Error types for rigor.

use thiserror::Error;

/// Failures loading or validating a [`WorldConfig`](crate::WorldConfig).
///
/// Simulation itself never fails; only configuration input does.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
