//! The canonical in-memory labeled array dataset.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{DatasetError, DatasetResult};
use crate::values::ArrayValues;

/// Conventional coordinate names shared by every reader.
pub const TIME: &str = "time";
pub const LAT: &str = "lat";
pub const LON: &str = "lon";

/// A named dimension and its length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dimension {
    pub name: String,
    pub size: usize,
}

impl Dimension {
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }
}

/// A named array declared over an ordered list of dimensions.
///
/// Used for both coordinates and data variables. Values are row-major in
/// `dims` order.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub dims: Vec<String>,
    pub values: ArrayValues,
    pub attrs: BTreeMap<String, String>,
}

impl Variable {
    pub fn new<S: Into<String>>(name: impl Into<String>, dims: Vec<S>, values: ArrayValues) -> Self {
        Self {
            name: name.into(),
            dims: dims.into_iter().map(Into::into).collect(),
            values,
            attrs: BTreeMap::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn units(&self) -> Option<&str> {
        self.attrs.get("units").map(String::as_str)
    }
}

/// Named dimensions, 1-D coordinates and N-D data variables.
///
/// Construction validates that every declared dimension exists and that
/// value lengths match the product of their dimension sizes. Instances are
/// never mutated after construction; every transformation returns a new
/// dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledArrayDataset {
    dims: Vec<Dimension>,
    coords: Vec<Variable>,
    data_vars: Vec<Variable>,
    attrs: BTreeMap<String, String>,
}

impl LabeledArrayDataset {
    pub fn new(
        dims: Vec<Dimension>,
        coords: Vec<Variable>,
        data_vars: Vec<Variable>,
    ) -> DatasetResult<Self> {
        let ds = Self {
            dims,
            coords,
            data_vars,
            attrs: BTreeMap::new(),
        };
        ds.validate()?;
        Ok(ds)
    }

    pub fn with_attrs(mut self, attrs: BTreeMap<String, String>) -> Self {
        self.attrs = attrs;
        self
    }

    fn validate(&self) -> DatasetResult<()> {
        let mut dim_names = BTreeSet::new();
        for dim in &self.dims {
            if !dim_names.insert(dim.name.as_str()) {
                return Err(DatasetError::invalid(format!(
                    "duplicate dimension '{}'",
                    dim.name
                )));
            }
        }

        let mut names = BTreeSet::new();
        for var in self.coords.iter().chain(&self.data_vars) {
            if !names.insert(var.name.as_str()) {
                return Err(DatasetError::invalid(format!(
                    "duplicate variable '{}'",
                    var.name
                )));
            }
            let shape = self.shape_of(var)?;
            let expected: usize = shape.iter().product();
            if var.values.len() != expected {
                return Err(DatasetError::invalid(format!(
                    "'{}' has {} values but its dimensions {:?} hold {}",
                    var.name,
                    var.values.len(),
                    var.dims,
                    expected
                )));
            }
        }

        for coord in &self.coords {
            if coord.dims.len() != 1 {
                return Err(DatasetError::invalid(format!(
                    "coordinate '{}' must be one-dimensional, found dims {:?}",
                    coord.name, coord.dims
                )));
            }
        }

        Ok(())
    }

    pub fn dims(&self) -> &[Dimension] {
        &self.dims
    }

    pub fn dim_size(&self, name: &str) -> Option<usize> {
        self.dims.iter().find(|d| d.name == name).map(|d| d.size)
    }

    pub fn coords(&self) -> &[Variable] {
        &self.coords
    }

    pub fn data_vars(&self) -> &[Variable] {
        &self.data_vars
    }

    pub fn attrs(&self) -> &BTreeMap<String, String> {
        &self.attrs
    }

    pub fn coord(&self, name: &str) -> Option<&Variable> {
        self.coords.iter().find(|c| c.name == name)
    }

    pub fn data_var(&self, name: &str) -> Option<&Variable> {
        self.data_vars.iter().find(|v| v.name == name)
    }

    /// True when `name` is a coordinate indexing a dimension of the same name.
    pub fn is_dimension_coord(&self, name: &str) -> bool {
        self.coord(name)
            .map(|c| c.dims.len() == 1 && c.dims[0] == name)
            .unwrap_or(false)
    }

    /// Resolve the shape of a variable from its dimension names.
    pub fn shape_of(&self, var: &Variable) -> DatasetResult<Vec<usize>> {
        var.dims
            .iter()
            .map(|d| {
                self.dim_size(d).ok_or_else(|| {
                    DatasetError::invalid(format!(
                        "'{}' declares unknown dimension '{}'",
                        var.name, d
                    ))
                })
            })
            .collect()
    }

    /// Index-based selection: keep only the listed positions along each
    /// dimension named in `picks`. Positions are kept in the given order.
    pub fn isel(&self, picks: &BTreeMap<String, Vec<usize>>) -> DatasetResult<Self> {
        for (dim, indices) in picks {
            let size = self
                .dim_size(dim)
                .ok_or_else(|| DatasetError::invalid(format!("unknown dimension '{}'", dim)))?;
            if let Some(&bad) = indices.iter().find(|&&i| i >= size) {
                return Err(DatasetError::invalid(format!(
                    "index {} out of bounds for dimension '{}' of size {}",
                    bad, dim, size
                )));
            }
        }

        let dims = self
            .dims
            .iter()
            .map(|d| match picks.get(&d.name) {
                Some(indices) => Dimension::new(d.name.clone(), indices.len()),
                None => d.clone(),
            })
            .collect();

        let select = |var: &Variable| -> DatasetResult<Variable> {
            let shape = self.shape_of(var)?;
            let axis_picks: Vec<Option<&[usize]>> = var
                .dims
                .iter()
                .map(|d| picks.get(d).map(Vec::as_slice))
                .collect();
            let flat = gather_indices(&shape, &axis_picks);
            Ok(Variable {
                values: var.values.take(&flat),
                ..var.clone()
            })
        };

        let coords = self.coords.iter().map(select).collect::<DatasetResult<_>>()?;
        let data_vars = self.data_vars.iter().map(select).collect::<DatasetResult<_>>()?;

        Ok(Self::new(dims, coords, data_vars)?.with_attrs(self.attrs.clone()))
    }

    /// Keep only the named data variables, plus the dimensions and
    /// coordinates they use.
    pub fn subset_variables(&self, names: &[&str]) -> DatasetResult<Self> {
        let mut data_vars = Vec::with_capacity(names.len());
        for name in names {
            let var = self.data_var(name).ok_or_else(|| {
                DatasetError::invalid(format!("data variable '{}' not found", name))
            })?;
            data_vars.push(var.clone());
        }

        let used: BTreeSet<&str> = data_vars
            .iter()
            .flat_map(|v| v.dims.iter().map(String::as_str))
            .collect();

        let dims = self
            .dims
            .iter()
            .filter(|d| used.contains(d.name.as_str()))
            .cloned()
            .collect();
        let coords = self
            .coords
            .iter()
            .filter(|c| c.dims.iter().all(|d| used.contains(d.as_str())))
            .cloned()
            .collect();

        Ok(Self::new(dims, coords, data_vars)?.with_attrs(self.attrs.clone()))
    }

    /// Return a copy with one coordinate's values replaced.
    pub fn replace_coord_values(&self, name: &str, values: ArrayValues) -> DatasetResult<Self> {
        let mut coords = self.coords.clone();
        let coord = coords
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| DatasetError::invalid(format!("coordinate '{}' not found", name)))?;
        coord.values = values;
        Ok(Self::new(self.dims.clone(), coords, self.data_vars.clone())?
            .with_attrs(self.attrs.clone()))
    }
}

/// Row-major strides for `shape`.
pub(crate) fn strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; shape.len()];
    for i in (0..shape.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * shape[i + 1];
    }
    strides
}

/// Flat indices of the cartesian product of per-axis picks, row-major.
///
/// `None` on an axis keeps every position along it.
pub(crate) fn gather_indices(shape: &[usize], picks: &[Option<&[usize]>]) -> Vec<usize> {
    let axes: Vec<Vec<usize>> = shape
        .iter()
        .zip(picks)
        .map(|(&n, pick)| match pick {
            Some(indices) => indices.to_vec(),
            None => (0..n).collect(),
        })
        .collect();

    if axes.iter().any(Vec::is_empty) {
        return Vec::new();
    }

    let strides = strides(shape);
    let total: usize = axes.iter().map(Vec::len).product();
    let mut out = Vec::with_capacity(total);
    let mut counter = vec![0usize; axes.len()];

    for _ in 0..total {
        out.push(
            counter
                .iter()
                .enumerate()
                .map(|(axis, &c)| axes[axis][c] * strides[axis])
                .sum(),
        );
        for axis in (0..counter.len()).rev() {
            counter[axis] += 1;
            if counter[axis] < axes[axis].len() {
                break;
            }
            counter[axis] = 0;
        }
    }

    out
}
