//! Error types for the storage crate.

use obs_dataset::DatasetError;
use thiserror::Error;

/// Errors that can occur while persisting or loading processed artifacts.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Missing or invalid configuration. Raised before anything is written.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The encoding cannot persist this kind of artifact.
    #[error("{encoding} cannot persist a {artifact}")]
    UnsupportedArtifact {
        encoding: &'static str,
        artifact: &'static str,
    },

    /// A variable or column type the encoding has no representation for.
    #[error("Unsupported type for '{name}': {kind}")]
    UnsupportedType { name: String, kind: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Zarr error: {0}")]
    Zarr(String),

    #[error("Object storage error: {0}")]
    ObjectStore(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),
}

impl StorageError {
    /// Create a Zarr error.
    pub fn zarr(msg: impl ToString) -> Self {
        Self::Zarr(msg.to_string())
    }

    /// Create an ObjectStore error.
    pub fn object_store(msg: impl Into<String>) -> Self {
        Self::ObjectStore(msg.into())
    }
}

impl From<walkdir::Error> for StorageError {
    fn from(err: walkdir::Error) -> Self {
        Self::Io(err.into())
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;
