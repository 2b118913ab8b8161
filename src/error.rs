use thiserror::Error;

/// Error types for the lrpc-rs library.
#[derive(Error, Debug)]
pub enum LrpcError {
    /// Error indicating a mismatch in matrix dimensions.
    #[error("Matrix dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Error for a configuration value rejected before any estimation work.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid input data.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The linear program for one column of the inverse estimate failed.
    #[error("Column {column} could not be solved: {reason}")]
    ColumnSolveFailed {
        /// Zero-based index of the failing column
        column: usize,
        /// Why the solve failed (infeasible, unbounded, degenerate solution)
        reason: String,
    },

    /// Linear algebra error.
    #[error("Linear algebra error: {0}")]
    LinearAlgebraError(String),

    /// Error raised by an external collaborator (re-estimator, thresholder).
    #[error("Collaborator error: {0}")]
    Collaborator(String),

    /// The worker pool could not be created.
    #[error("Worker pool error: {0}")]
    WorkerPool(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type alias for lrpc-rs operations.
pub type Result<T> = std::result::Result<T, LrpcError>;

impl From<rayon::ThreadPoolBuildError> for LrpcError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        LrpcError::WorkerPool(err.to_string())
    }
}
