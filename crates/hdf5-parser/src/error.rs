//! Error types for HDF5 retrieval parsing.

use obs_dataset::DatasetError;
use thiserror::Error;

/// Result type for HDF5 parser operations.
pub type Hdf5Result<T> = Result<T, Hdf5Error>;

#[derive(Error, Debug)]
pub enum Hdf5Error {
    /// A required top-level group is absent
    #[error("Missing required group: {0}")]
    MissingGroup(String),

    /// A required dataset is absent inside an existing group
    #[error("Missing required data: {0}")]
    MissingData(String),

    /// Datasets are present but cannot be interpreted
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("HDF5 error: {0}")]
    Hdf5(#[from] hdf5::Error),

    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),
}
