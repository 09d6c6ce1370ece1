//! OCO-2 L2 retrieval file layout.
//!
//! Soundings are spread across three groups: results (`xco2`), geometry
//! (`retrieval_latitude`, `retrieval_longitude`) and header
//! (`retrieval_time_string`). All four datasets are one value per sounding.

use std::collections::BTreeMap;
use std::path::Path;

use hdf5::types::{FixedAscii, FixedUnicode, TypeDescriptor, VarLenAscii, VarLenUnicode};
use hdf5::{File, Group};
use obs_dataset::{ArrayValues, Dimension, LabeledArrayDataset, Variable, LAT, LON, TIME};
use tracing::{debug, instrument};

use crate::error::{Hdf5Error, Hdf5Result};

pub const RETRIEVAL_RESULTS: &str = "RetrievalResults";
pub const RETRIEVAL_GEOMETRY: &str = "RetrievalGeometry";
pub const RETRIEVAL_HEADER: &str = "RetrievalHeader";

/// Groups checked before any dataset is read.
pub const REQUIRED_GROUPS: [&str; 3] = [RETRIEVAL_RESULTS, RETRIEVAL_GEOMETRY, RETRIEVAL_HEADER];

pub const LATITUDE_DATASET: &str = "retrieval_latitude";
pub const LONGITUDE_DATASET: &str = "retrieval_longitude";
pub const TIME_DATASET: &str = "retrieval_time_string";
pub const XCO2_DATASET: &str = "xco2";

/// Synthetic sample dimension.
pub const RETRIEVAL_DIM: &str = "retrieval";

/// Dry-air mole fraction to parts per million.
pub const PPM_SCALE: f64 = 1e6;

/// Upper bound on fixed-length timestamp strings.
const MAX_FIXED_STRING: usize = 64;

/// Fail with [`Hdf5Error::MissingGroup`] unless every required group exists.
pub fn validate_groups(file: &File) -> Hdf5Result<()> {
    let members = file.member_names()?;
    for group in REQUIRED_GROUPS {
        if !members.iter().any(|m| m == group) {
            return Err(Hdf5Error::MissingGroup(group.to_string()));
        }
    }
    Ok(())
}

/// Read one retrieval file into a dataset over the `retrieval` dimension.
///
/// Coordinates are `time` (still string-encoded), `lat` and `lon`; the only
/// data variable is `xco2` in ppm.
#[instrument(skip(path), fields(path = %path.display()))]
pub fn read_retrieval_file(path: &Path) -> Hdf5Result<LabeledArrayDataset> {
    let file = File::open(path)?;
    validate_groups(&file)?;

    let geometry = file.group(RETRIEVAL_GEOMETRY)?;
    let header = file.group(RETRIEVAL_HEADER)?;
    let results = file.group(RETRIEVAL_RESULTS)?;

    let lat = read_f64(&geometry, LATITUDE_DATASET)?;
    let lon = read_f64(&geometry, LONGITUDE_DATASET)?;
    let time = read_strings(&header, TIME_DATASET)?;
    let xco2: Vec<f64> = read_f64(&results, XCO2_DATASET)?
        .into_iter()
        .map(|v| v * PPM_SCALE)
        .collect();

    let n = xco2.len();
    for (name, len) in [
        (LATITUDE_DATASET, lat.len()),
        (LONGITUDE_DATASET, lon.len()),
        (TIME_DATASET, time.len()),
    ] {
        if len != n {
            return Err(Hdf5Error::InvalidFormat(format!(
                "{} has {} soundings, {} has {}",
                name, len, XCO2_DATASET, n
            )));
        }
    }

    let ds = LabeledArrayDataset::new(
        vec![Dimension::new(RETRIEVAL_DIM, n)],
        vec![
            Variable::new(TIME, vec![RETRIEVAL_DIM], ArrayValues::Text(time)),
            Variable::new(LAT, vec![RETRIEVAL_DIM], ArrayValues::Float64(lat))
                .with_attr("units", "degrees_north"),
            Variable::new(LON, vec![RETRIEVAL_DIM], ArrayValues::Float64(lon))
                .with_attr("units", "degrees_east"),
        ],
        vec![Variable::new(XCO2_DATASET, vec![RETRIEVAL_DIM], ArrayValues::Float64(xco2))
            .with_attr("units", "ppm")],
    )?
    .with_attrs(BTreeMap::from([(
        "source".to_string(),
        path.file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default(),
    )]));

    debug!(soundings = n, "Read retrieval file");
    // `file` and its groups close here
    Ok(ds)
}

fn dataset(group: &Group, name: &str) -> Hdf5Result<hdf5::Dataset> {
    group
        .dataset(name)
        .map_err(|_| Hdf5Error::MissingData(format!("{}/{}", group.name(), name)))
}

fn read_f64(group: &Group, name: &str) -> Hdf5Result<Vec<f64>> {
    Ok(dataset(group, name)?.read_raw::<f64>()?)
}

/// Read a string dataset regardless of its HDF5 string encoding.
fn read_strings(group: &Group, name: &str) -> Hdf5Result<Vec<String>> {
    let ds = dataset(group, name)?;
    let descriptor = ds.dtype()?.to_descriptor()?;

    let strings = match descriptor {
        TypeDescriptor::VarLenUnicode => ds
            .read_raw::<VarLenUnicode>()?
            .iter()
            .map(|s| s.as_str().to_string())
            .collect(),
        TypeDescriptor::VarLenAscii => ds
            .read_raw::<VarLenAscii>()?
            .iter()
            .map(|s| s.as_str().to_string())
            .collect(),
        TypeDescriptor::FixedAscii(len) if len <= MAX_FIXED_STRING => ds
            .read_raw::<FixedAscii<MAX_FIXED_STRING>>()?
            .iter()
            .map(|s| s.as_str().to_string())
            .collect(),
        TypeDescriptor::FixedUnicode(len) if len <= MAX_FIXED_STRING => ds
            .read_raw::<FixedUnicode<MAX_FIXED_STRING>>()?
            .iter()
            .map(|s| s.as_str().to_string())
            .collect(),
        other => {
            return Err(Hdf5Error::InvalidFormat(format!(
                "{}/{} has unsupported type {:?}",
                group.name(),
                name,
                other
            )))
        }
    };

    Ok(strings)
}
