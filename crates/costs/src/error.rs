use thiserror::Error;

/// Failure raised by a cost estimator.
#[derive(Debug, Error)]
pub enum CostError {
    #[error("cost estimator used before initialization")]
    NotInitialized,
    #[error("estimator was initialized for graph '{expected}', got '{actual}'")]
    UnknownGraph { expected: String, actual: String },
    #[error("failed to read cost table: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse cost table: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("cost estimation failed: {0}")]
    Estimation(String),
}
