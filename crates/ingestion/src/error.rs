//! Error types for the ingestion crate.

use std::path::PathBuf;

use obs_dataset::DatasetError;
use thiserror::Error;

/// Errors that can occur during ingestion.
#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("Failed to read file: {0}")]
    FileRead(#[from] std::io::Error),

    /// A raw file could not be parsed as its declared format.
    #[error("Format error in {}: {}", .path.display(), .message)]
    Format { path: PathBuf, message: String },

    #[error("No input files matching '{}' in {}", .pattern, .dir.display())]
    NoInputFiles { dir: PathBuf, pattern: String },

    /// Per-file datasets do not share a layout and cannot be combined.
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Dataset error: {0}")]
    Dataset(DatasetError),

    #[error("Failed to list input directory: {0}")]
    Discovery(#[from] walkdir::Error),
}

impl From<DatasetError> for IngestionError {
    fn from(err: DatasetError) -> Self {
        match err {
            DatasetError::SchemaMismatch(msg) => Self::SchemaMismatch(msg),
            other => Self::Dataset(other),
        }
    }
}

impl IngestionError {
    pub(crate) fn format(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Format {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestionError>;
