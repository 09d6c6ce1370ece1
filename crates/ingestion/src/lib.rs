//! Satellite observation ingestion library.
//!
//! Turns closed sets of raw observation files into windowed datasets and
//! tables.
//!
//! # Architecture
//!
//! - Input discovery by filename prefix and extension under `<data>/raw`
//! - Format readers dispatched on [`FormatTag`] (NetCDF grids, HDF5 retrievals)
//! - Combine per-file datasets, select a spatio-temporal window, project to
//!   a table
//!
//! Persisting results is left to the `storage` crate.

pub mod config;
pub mod discovery;
pub mod error;
mod ingester;
pub mod metadata;
pub mod reader;

// Re-exports
pub use config::{IngestionConfig, SourceSpec};
pub use discovery::discover_files;
pub use error::{IngestionError, Result};
pub use ingester::{Ingester, IngestionResult};
pub use metadata::{FormatTag, RawObservationFile};
pub use reader::{
    read_observation_file, reader_for, FormatReader, GridArrayReader, HierarchicalBinaryReader,
};
