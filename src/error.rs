//! Error types for the consumption preprocessing pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PrepError>;

/// Main error type for the pipeline.
///
/// Every variant is fatal to the current run: stages propagate with `?` and
/// no partial output is returned.
#[derive(Error, Debug)]
pub enum PrepError {
    #[error("Schema error: {0}")]
    SchemaError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Duplicate timestamp: {0}")]
    DuplicateTimestamp(String),

    #[error("Insufficient data: {0}")]
    InsufficientDataError(String),

    #[error("Alignment error: {0}")]
    AlignmentError(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Model not fitted")]
    ModelNotFitted,
}

impl PrepError {
    /// Shorthand for the missing-column case
    pub(crate) fn missing_column(name: &str) -> Self {
        PrepError::SchemaError(format!("expected column '{}' is absent", name))
    }
}

impl From<polars::error::PolarsError> for PrepError {
    fn from(err: polars::error::PolarsError) -> Self {
        PrepError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for PrepError {
    fn from(err: serde_json::Error) -> Self {
        PrepError::SerializationError(err.to_string())
    }
}
