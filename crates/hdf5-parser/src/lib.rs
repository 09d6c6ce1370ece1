//! HDF5 parser for scattered satellite retrievals.
//!
//! Reads OCO-2 Level 2 lite/standard files, which store one value per
//! sounding across nested groups rather than on a grid. The result is a
//! [`obs_dataset::LabeledArrayDataset`] over a single `retrieval` dimension,
//! with `xco2` rescaled from mole fraction to ppm.

pub mod error;
pub mod retrieval;

pub use error::{Hdf5Error, Hdf5Result};
pub use retrieval::{
    read_retrieval_file, validate_groups, PPM_SCALE, REQUIRED_GROUPS, RETRIEVAL_DIM,
    RETRIEVAL_GEOMETRY, RETRIEVAL_HEADER, RETRIEVAL_RESULTS,
};
