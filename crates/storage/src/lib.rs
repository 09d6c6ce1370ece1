//! Persistence of processed observations.
//!
//! Provides:
//! - Tab-separated CSV and Parquet encodings for observation tables
//! - Zarr V3 stores for labeled array datasets, chunked by the chunk planner
//! - Local and object storage (MinIO/S3) destinations, plus loaders for
//!   reading tabular artifacts back

pub mod config;
pub mod destination;
pub mod error;
pub mod loader;
pub mod object_store;
pub mod upload;
pub mod writer;

pub use self::object_store::{
    processed_key, ObjectStorage, ObjectStorageConfig, PROCESSED_PREFIX,
};
pub use config::{WriterConfig, ZarrCompression};
pub use destination::{Artifact, Destination, Encoding};
pub use error::{StorageError, StorageResult};
pub use loader::{fetch_table, load_csv, load_parquet};
pub use upload::upload_directory;
pub use writer::{
    artifact_path, PersistenceWriter, WriteResult, CO2_ARTIFACT, TEMPANOMALIES_ARTIFACT,
};
