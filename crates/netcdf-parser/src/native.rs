//! Native NetCDF reading using the netcdf library.
//!
//! Grid files are read whole: every numeric variable with at least one
//! dimension is loaded with packing applied, dimension coordinates carrying
//! CF time units are decoded to timestamps, and the file's own dimension
//! names and order are kept unchanged.
//!
//! Element types follow the file. Packed variables take the type of their
//! `scale_factor` (a `float` scale yields `Float32`), unpacked floats keep
//! their width, and integers without a fill value stay `Int64`. Integers
//! with a fill value widen to `Float64` so the fill can become NaN.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Once;

use obs_dataset::time::{decode_cf_time, is_cf_time_units};
use netcdf::types::{FloatType, NcVariableType};
use obs_dataset::{ArrayValues, DataKind, Dimension, LabeledArrayDataset, Variable, LAT, LON};
use tracing::{debug, instrument};

use crate::error::{NetCdfError, NetCdfResult};

/// Attributes consumed while unpacking and not carried onto the dataset.
const PACKING_ATTRS: [&str; 4] = ["scale_factor", "add_offset", "_FillValue", "missing_value"];

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints verbose error messages to stderr even when errors
/// are handled gracefully by the Rust code (e.g., when checking for optional
/// attributes that don't exist). This creates confusing log spam like:
///
/// ```text
/// HDF5-DIAG: Error detected in HDF5 (1.10.8) thread 3:
///   #003: ../../../src/H5Adense.c line 397 in H5A__dense_open(): can't locate attribute in name index
/// ```
///
/// Safe to call multiple times; only the first call does anything.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and we're passing null pointers
        // to disable error output, which is a documented valid use.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// Read a grid-array file into a labeled dataset.
///
/// Every name in `required` must be present as a readable data variable,
/// otherwise [`NetCdfError::MissingData`] is returned. `lat` and `lon`
/// dimension coordinates must be sorted ascending.
#[instrument(skip(path, required), fields(path = %path.display()))]
pub fn read_grid_file(path: &Path, required: &[&str]) -> NetCdfResult<LabeledArrayDataset> {
    silence_hdf5_errors();

    if !path.exists() {
        return Err(NetCdfError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} not found", path.display()),
        )));
    }

    let file = netcdf::open(path)
        .map_err(|e| NetCdfError::InvalidFormat(format!("Failed to open NetCDF: {}", e)))?;

    let dims: Vec<Dimension> = file
        .dimensions()
        .map(|d| Dimension::new(d.name(), d.len()))
        .collect();

    let mut coords = Vec::new();
    let mut data_vars = Vec::new();

    for var in file.variables() {
        let name = var.name();
        let var_dims: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
        if var_dims.is_empty() {
            debug!(variable = %name, "Skipping scalar variable");
            continue;
        }

        let Some(kind) = decoded_kind(&var) else {
            debug!(variable = %name, vartype = ?var.vartype(), "Skipping non-numeric variable");
            continue;
        };

        let mut attrs = string_attrs(&var);
        let is_coord = var_dims.len() == 1 && var_dims[0] == name;
        let cf_units = attrs
            .get("units")
            .filter(|u| is_coord && is_cf_time_units(u))
            .cloned();

        let values = match cf_units {
            Some(units) => {
                let offsets = unpack(&var, read_f64(&var, &name)?);
                let times = decode_cf_time(&offsets, &units).map_err(|e| {
                    NetCdfError::InvalidFormat(format!("Failed to decode '{}': {}", name, e))
                })?;
                attrs.remove("units");
                ArrayValues::Time(times)
            }
            None => read_values(&var, &name, kind)?,
        };

        if !is_coord {
            data_vars.push(Variable {
                name,
                dims: var_dims,
                values,
                attrs,
            });
            continue;
        }

        if (name == LAT || name == LON) && !values.is_sorted_ascending() {
            return Err(NetCdfError::InvalidFormat(format!(
                "coordinate '{}' is not sorted ascending",
                name
            )));
        }

        coords.push(Variable {
            name,
            dims: var_dims,
            values,
            attrs,
        });
    }

    for name in required {
        if !data_vars.iter().any(|v| v.name == *name) {
            return Err(NetCdfError::MissingData(format!("{} variable", name)));
        }
    }

    let global_attrs = file
        .attributes()
        .filter_map(|attr| match attr.value() {
            Ok(netcdf::AttributeValue::Str(s)) => Some((attr.name().to_string(), s)),
            _ => None,
        })
        .collect();

    let ds = LabeledArrayDataset::new(dims, coords, data_vars)?.with_attrs(global_attrs);

    debug!(
        dims = ?ds.dims().iter().map(|d| (&d.name, d.size)).collect::<Vec<_>>(),
        variables = ds.data_vars().len(),
        "Read NetCDF grid file"
    );

    Ok(ds)
}

/// Element type a variable decodes to, `None` for non-numeric variables.
fn decoded_kind(var: &netcdf::Variable) -> Option<DataKind> {
    let packing = ["scale_factor", "add_offset"]
        .into_iter()
        .find(|attr| has_attr(var, attr))
        .and_then(|attr| var.attribute_value(attr))
        .and_then(|r| r.ok());

    match var.vartype() {
        NcVariableType::Int(_) | NcVariableType::Float(_) if packing.is_some() => {
            match packing {
                Some(netcdf::AttributeValue::Float(_)) => Some(DataKind::Float32),
                _ => Some(DataKind::Float64),
            }
        }
        NcVariableType::Float(FloatType::F32) => Some(DataKind::Float32),
        NcVariableType::Float(FloatType::F64) => Some(DataKind::Float64),
        NcVariableType::Int(_) if has_fill(var) => Some(DataKind::Float64),
        NcVariableType::Int(_) => Some(DataKind::Int64),
        _ => None,
    }
}

fn has_fill(var: &netcdf::Variable) -> bool {
    has_attr(var, "_FillValue") || has_attr(var, "missing_value")
}

fn read_f64(var: &netcdf::Variable, name: &str) -> NetCdfResult<Vec<f64>> {
    var.get_values::<f64, _>(..)
        .map_err(|e| NetCdfError::InvalidFormat(format!("Failed to read '{}': {}", name, e)))
}

fn read_values(var: &netcdf::Variable, name: &str, kind: DataKind) -> NetCdfResult<ArrayValues> {
    let values = match kind {
        DataKind::Int64 => ArrayValues::Int64(var.get_values::<i64, _>(..).map_err(|e| {
            NetCdfError::InvalidFormat(format!("Failed to read '{}': {}", name, e))
        })?),
        DataKind::Float32 => ArrayValues::Float32(
            unpack(var, read_f64(var, name)?)
                .into_iter()
                .map(|v| v as f32)
                .collect(),
        ),
        _ => ArrayValues::Float64(unpack(var, read_f64(var, name)?)),
    };
    Ok(values)
}

/// Apply `_FillValue`/`missing_value` (to NaN), then `scale_factor` and
/// `add_offset`.
fn unpack(var: &netcdf::Variable, raw: Vec<f64>) -> Vec<f64> {
    let fill = get_f64_attr(var, "_FillValue").or_else(|| get_f64_attr(var, "missing_value"));
    let scale = get_f64_attr(var, "scale_factor").unwrap_or(1.0);
    let offset = get_f64_attr(var, "add_offset").unwrap_or(0.0);

    if fill.is_none() && scale == 1.0 && offset == 0.0 {
        return raw;
    }

    raw.into_iter()
        .map(|v| {
            if Some(v) == fill {
                f64::NAN
            } else {
                v * scale + offset
            }
        })
        .collect()
}

fn string_attrs(var: &netcdf::Variable) -> BTreeMap<String, String> {
    var.attributes()
        .filter(|attr| !PACKING_ATTRS.contains(&attr.name()))
        .filter_map(|attr| match attr.value() {
            Ok(netcdf::AttributeValue::Str(s)) => Some((attr.name().to_string(), s)),
            _ => None,
        })
        .collect()
}

/// Check if a variable has an attribute with the given name.
/// This avoids HDF5 error spam when checking for optional attributes.
fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

fn get_f64_attr(var: &netcdf::Variable, name: &str) -> Option<f64> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f64::try_from(attr_value).ok()
}
