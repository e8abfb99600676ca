//! Scheduler error type.

use thiserror::Error;

/// Result alias for scheduler operations.
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Errors raised by scheduler configuration.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Negative, non-finite, or so small that `1000 / rate` overflows.
    #[error("invalid target rate {rate}: expected a finite rate >= 0 with a finite tick interval")]
    InvalidRate { rate: f64 },

    /// A JSON config failed to parse.
    #[error("invalid scheduler config: {0}")]
    Config(#[from] serde_json::Error),
}
