//! NetCDF parser for gridded observation files.
//!
//! Reads self-describing grid-array files (e.g. GISTEMP surface temperature
//! anomalies) into [`obs_dataset::LabeledArrayDataset`], keeping the file's
//! native dimensions, coordinates and variables.
//!
//! # Implementation Notes
//!
//! Reading goes through the `netcdf` crate, which links libnetcdf and HDF5.
//! Packed variables are unpacked on read and CF time axes are decoded to
//! timezone-naive UTC timestamps.

pub mod error;
pub mod native;

pub use error::{NetCdfError, NetCdfResult};
pub use native::{read_grid_file, silence_hdf5_errors};
