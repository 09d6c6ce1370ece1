//! Error types for dataset operations.

use thiserror::Error;

use crate::time::TimeParseError;

/// Result type alias using DatasetError.
pub type DatasetResult<T> = Result<T, DatasetError>;

/// Errors raised while building or transforming labeled array datasets.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Inputs to a combine do not share the same layout.
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// A dataset violates its structural invariants.
    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),

    /// Window bounds are inverted or not finite.
    #[error("Invalid window: {0}")]
    InvalidWindow(String),

    /// Range selection was asked to slice an unsorted axis.
    #[error("Axis '{0}' is not sorted in ascending order")]
    UnsortedAxis(String),

    #[error("Time error: {0}")]
    Time(#[from] TimeParseError),
}

impl DatasetError {
    /// Create a SchemaMismatch error.
    pub fn schema_mismatch(msg: impl Into<String>) -> Self {
        Self::SchemaMismatch(msg.into())
    }

    /// Create an InvalidDataset error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidDataset(msg.into())
    }
}
