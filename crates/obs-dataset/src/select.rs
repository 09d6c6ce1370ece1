//! Spatio-Temporal Selector.
//!
//! Gridded datasets carry `lat` and `lon` as sorted dimension coordinates and
//! are narrowed with contiguous index ranges. Scattered datasets carry
//! `time`, `lat` and `lon` as per-sample coordinates over one shared
//! dimension and are narrowed with an element-wise mask.

use std::collections::BTreeMap;

use tracing::debug;

use crate::dataset::{LabeledArrayDataset, Variable, LAT, LON, TIME};
use crate::error::{DatasetError, DatasetResult};
use crate::window::BoundingWindow;

/// How a dataset's coordinates are laid out for selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionStrategy {
    /// `lat`/`lon` are dimension coordinates on sorted axes.
    Range,
    /// `time`/`lat`/`lon` share the named sample dimension.
    Masked { sample_dim: String },
}

/// Decide which selection strategy applies to `ds`.
pub fn selection_strategy(ds: &LabeledArrayDataset) -> DatasetResult<SelectionStrategy> {
    if ds.is_dimension_coord(LAT) && ds.is_dimension_coord(LON) {
        return Ok(SelectionStrategy::Range);
    }

    let sample_dim = |name: &str| -> DatasetResult<String> {
        ds.coord(name)
            .map(|c| c.dims[0].clone())
            .ok_or_else(|| DatasetError::invalid(format!("missing '{}' coordinate", name)))
    };
    let (t, y, x) = (sample_dim(TIME)?, sample_dim(LAT)?, sample_dim(LON)?);
    if t != y || y != x {
        return Err(DatasetError::invalid(format!(
            "time/lat/lon coordinates span different dimensions ({}, {}, {})",
            t, y, x
        )));
    }

    Ok(SelectionStrategy::Masked { sample_dim: t })
}

/// Restrict `ds` to the window's year floor and latitude/longitude box.
///
/// Zero matching samples yield a valid dataset with a zero-length dimension.
pub fn select(ds: &LabeledArrayDataset, window: &BoundingWindow) -> DatasetResult<LabeledArrayDataset> {
    match selection_strategy(ds)? {
        SelectionStrategy::Range => select_range(ds, window),
        SelectionStrategy::Masked { sample_dim } => select_masked(ds, window, &sample_dim),
    }
}

/// Range selection over sorted grid axes.
pub fn select_range(
    ds: &LabeledArrayDataset,
    window: &BoundingWindow,
) -> DatasetResult<LabeledArrayDataset> {
    if !ds.is_dimension_coord(TIME) {
        return Err(DatasetError::invalid(
            "range selection needs a 'time' dimension coordinate",
        ));
    }

    let times = coord(ds, TIME)?.values.to_datetimes()?;
    let keep_times: Vec<usize> = times
        .iter()
        .enumerate()
        .filter(|(_, t)| window.contains_time(t))
        .map(|(i, _)| i)
        .collect();

    let mut picks = BTreeMap::new();
    picks.insert(TIME.to_string(), keep_times);
    picks.insert(
        LAT.to_string(),
        inclusive_range(coord(ds, LAT)?, window.lat_min, window.lat_max)?,
    );
    picks.insert(
        LON.to_string(),
        inclusive_range(coord(ds, LON)?, window.lon_min, window.lon_max)?,
    );

    let out = ds.isel(&picks)?;
    debug!(
        strategy = "range",
        time = out.dim_size(TIME).unwrap_or(0),
        lat = out.dim_size(LAT).unwrap_or(0),
        lon = out.dim_size(LON).unwrap_or(0),
        "Selected window"
    );
    Ok(out)
}

/// Masked selection over a shared sample dimension.
///
/// Variables spanning `sample_dim` are filtered with the same mask; all
/// others pass through untouched.
pub fn select_masked(
    ds: &LabeledArrayDataset,
    window: &BoundingWindow,
    sample_dim: &str,
) -> DatasetResult<LabeledArrayDataset> {
    let times = coord(ds, TIME)?.values.to_datetimes()?;
    let lats = coord(ds, LAT)?.values.to_f64_vec()?;
    let lons = coord(ds, LON)?.values.to_f64_vec()?;

    let keep: Vec<usize> = (0..times.len())
        .filter(|&i| window.contains(&times[i], lats[i], lons[i]))
        .collect();

    let total = times.len();
    let mut picks = BTreeMap::new();
    picks.insert(sample_dim.to_string(), keep);
    let out = ds.isel(&picks)?;

    debug!(
        strategy = "masked",
        total = total,
        retained = out.dim_size(sample_dim).unwrap_or(0),
        "Selected window"
    );
    Ok(out)
}

fn coord<'a>(ds: &'a LabeledArrayDataset, name: &str) -> DatasetResult<&'a Variable> {
    ds.coord(name)
        .ok_or_else(|| DatasetError::invalid(format!("missing '{}' coordinate", name)))
}

fn inclusive_range(axis: &Variable, min: f64, max: f64) -> DatasetResult<Vec<usize>> {
    if !axis.values.is_sorted_ascending() {
        return Err(DatasetError::UnsortedAxis(axis.name.clone()));
    }
    let values = axis.values.to_f64_vec()?;
    let start = values.partition_point(|&v| v < min);
    let end = values.partition_point(|&v| v <= max);
    Ok((start..end.max(start)).collect())
}
