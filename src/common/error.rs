//! Error types for frontier_mcts

use thiserror::Error;

/// Main error type for the exploration planner
#[derive(Debug, Error)]
pub enum PlannerError {
    /// Invalid configuration value
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    /// Precondition of a model was violated (e.g. non-positive max speed)
    #[error("Domain error: {0}")]
    Domain(String),
    /// An operation was called in the wrong lifecycle state
    #[error("State error: {0}")]
    StateError(String),
    /// External collaborator (obstacle map, reward source) failed
    #[error("Oracle error: {0}")]
    Oracle(String),
    /// A model produced a non-finite number
    #[error("Numerical error: {0}")]
    Numerical(String),
    /// Configuration file could not be parsed
    #[error("Config error: {0}")]
    Config(String),
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for planner operations
pub type PlannerResult<T> = Result<T, PlannerError>;

/// Fail with [`PlannerError::Numerical`] unless `value` is finite.
pub fn ensure_finite(value: f64, what: &str) -> PlannerResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(PlannerError::Numerical(format!("{} is not finite: {}", what, value)))
    }
}
