//! Error types for parameter-contract violations.
//!
//! Data-quality problems (NaN scores, missing keys) never surface here; the
//! engines degrade around them. These errors are reserved for callers that
//! hand the library something it cannot interpret.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unknown metric '{0}', expected Total or one of the nine score categories")]
    UnknownMetric(String),

    #[error("paired series differ in length: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StatsError>;
