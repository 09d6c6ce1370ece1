//! Format Reader dispatch.
//!
//! One [`FormatReader`] implementation per [`FormatTag`]. Each read opens the
//! file, builds a dataset and releases the handle before returning.

use hdf5_parser::Hdf5Error;
use netcdf_parser::NetCdfError;
use obs_dataset::LabeledArrayDataset;
use tracing::info;

use crate::error::{IngestionError, Result};
use crate::metadata::{FormatTag, RawObservationFile};

/// Parses one raw file into a labeled dataset.
pub trait FormatReader: Send + Sync {
    /// The format this reader handles.
    fn format(&self) -> FormatTag;

    fn read(&self, file: &RawObservationFile) -> Result<LabeledArrayDataset>;
}

/// NetCDF grid files, exposed with their native layout.
#[derive(Debug, Default, Clone, Copy)]
pub struct GridArrayReader;

impl FormatReader for GridArrayReader {
    fn format(&self) -> FormatTag {
        FormatTag::GridArray
    }

    fn read(&self, file: &RawObservationFile) -> Result<LabeledArrayDataset> {
        let required: Vec<&str> = file.variables.iter().map(String::as_str).collect();
        netcdf_parser::read_grid_file(&file.path, &required).map_err(|e| match e {
            NetCdfError::IoError(io) => IngestionError::FileRead(io),
            other => IngestionError::format(&file.path, other),
        })
    }
}

/// OCO-2 style HDF5 retrieval files.
#[derive(Debug, Default, Clone, Copy)]
pub struct HierarchicalBinaryReader;

impl FormatReader for HierarchicalBinaryReader {
    fn format(&self) -> FormatTag {
        FormatTag::HierarchicalBinary
    }

    fn read(&self, file: &RawObservationFile) -> Result<LabeledArrayDataset> {
        if !file.path.exists() {
            return Err(IngestionError::FileRead(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not found", file.path.display()),
            )));
        }

        let ds = hdf5_parser::read_retrieval_file(&file.path).map_err(|e: Hdf5Error| {
            IngestionError::format(&file.path, e)
        })?;

        for name in &file.variables {
            if ds.data_var(name).is_none() {
                return Err(IngestionError::format(
                    &file.path,
                    format!("variable '{}' not produced by retrieval reader", name),
                ));
            }
        }
        Ok(ds)
    }
}

/// Reader for a format tag.
pub fn reader_for(format: FormatTag) -> Box<dyn FormatReader> {
    match format {
        FormatTag::GridArray => Box::new(GridArrayReader),
        FormatTag::HierarchicalBinary => Box::new(HierarchicalBinaryReader),
    }
}

/// Read a raw file with the reader matching its format tag.
///
/// Takes the descriptor by value: each raw file is read once per run.
pub fn read_observation_file(file: RawObservationFile) -> Result<LabeledArrayDataset> {
    let ds = reader_for(file.format).read(&file)?;

    info!(
        file = %file.file_name(),
        format = %file.format,
        dims = ?ds.dims().iter().map(|d| (&d.name, d.size)).collect::<Vec<_>>(),
        "Read raw observation file"
    );

    Ok(ds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_by_tag() {
        assert_eq!(reader_for(FormatTag::GridArray).format(), FormatTag::GridArray);
        assert_eq!(
            reader_for(FormatTag::HierarchicalBinary).format(),
            FormatTag::HierarchicalBinary
        );
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let file = RawObservationFile::new(
            FormatTag::HierarchicalBinary,
            "/nonexistent/oco2.h5",
            vec!["xco2".into()],
        );
        assert!(matches!(
            read_observation_file(file),
            Err(IngestionError::FileRead(_))
        ));
    }
}
