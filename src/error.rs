//! Error types for the harvest-ml pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Main error type for the pipeline
///
/// Every failure is fatal to the run: all computations are deterministic
/// given their seed and inputs, so retrying without changing inputs would
/// reproduce the same failure.
#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Schema mismatch: column '{column}' expected by the fitted recipe is missing")]
    SchemaMismatch { column: String },

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Undefined metric: {0}")]
    UndefinedMetric(String),

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<polars::error::PolarsError> for HarvestError {
    fn from(err: polars::error::PolarsError) -> Self {
        HarvestError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for HarvestError {
    fn from(err: serde_json::Error) -> Self {
        HarvestError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for HarvestError {
    fn from(err: ndarray::ShapeError) -> Self {
        HarvestError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
