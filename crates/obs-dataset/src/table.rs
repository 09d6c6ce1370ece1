//! Tabular Projector and the row-oriented `ObservationTable`.

use tracing::debug;

use crate::dataset::{strides, Dimension, LabeledArrayDataset, Variable, LAT, LON, TIME};
use crate::error::{DatasetError, DatasetResult};
use crate::values::ArrayValues;

/// Dimension name used when a table is lifted back into a dataset.
pub const INDEX_DIM: &str = "index";

/// One named column of an [`ObservationTable`].
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: ArrayValues,
}

impl Column {
    pub fn new(name: impl Into<String>, values: ArrayValues) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Row-oriented table: equal-length named columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObservationTable {
    columns: Vec<Column>,
}

impl ObservationTable {
    pub fn new(columns: Vec<Column>) -> DatasetResult<Self> {
        if let Some(first) = columns.first() {
            let rows = first.values.len();
            for col in &columns {
                if col.values.len() != rows {
                    return Err(DatasetError::invalid(format!(
                        "column '{}' has {} rows, expected {}",
                        col.name,
                        col.values.len(),
                        rows
                    )));
                }
            }
        }
        for (i, col) in columns.iter().enumerate() {
            if columns[..i].iter().any(|c| c.name == col.name) {
                return Err(DatasetError::invalid(format!(
                    "duplicate column '{}'",
                    col.name
                )));
            }
        }
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map(|c| c.values.len()).unwrap_or(0)
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }
}

/// Flatten `ds` into rows over the cross product of the dimensions its data
/// variables span.
///
/// Columns are the dimension coordinates (dimension order), then the other
/// coordinates, then the data variables. The first dimension varies
/// slowest. Coordinates are broadcast to every row.
pub fn to_table(ds: &LabeledArrayDataset) -> DatasetResult<ObservationTable> {
    let used: Vec<&Dimension> = if ds.data_vars().is_empty() {
        ds.dims().iter().collect()
    } else {
        ds.dims()
            .iter()
            .filter(|d| ds.data_vars().iter().any(|v| v.dims.contains(&d.name)))
            .collect()
    };
    let names: Vec<&str> = used.iter().map(|d| d.name.as_str()).collect();
    let shape: Vec<usize> = used.iter().map(|d| d.size).collect();
    let rows: usize = shape.iter().product();

    let spans_table = |v: &Variable| v.dims.iter().all(|d| names.contains(&d.as_str()));

    let dimension_coords = names
        .iter()
        .filter_map(|n| ds.coord(n).filter(|c| ds.is_dimension_coord(&c.name)));
    let other_coords = ds
        .coords()
        .iter()
        .filter(|c| !ds.is_dimension_coord(&c.name) && spans_table(c));

    let mut columns = Vec::new();
    for var in dimension_coords.chain(other_coords).chain(ds.data_vars()) {
        if !spans_table(var) {
            return Err(DatasetError::invalid(format!(
                "'{}' spans {:?}, outside the table dimensions {:?}",
                var.name, var.dims, names
            )));
        }
        let var_shape = ds.shape_of(var)?;
        let indices = broadcast_indices(&names, &shape, &var.dims, &var_shape, rows);
        columns.push(Column::new(var.name.clone(), var.values.take(&indices)));
    }

    debug!(rows = rows, columns = columns.len(), "Projected dataset to table");
    ObservationTable::new(columns)
}

/// For every table row, the flat index into a variable over `var_dims`.
fn broadcast_indices(
    table_dims: &[&str],
    table_shape: &[usize],
    var_dims: &[String],
    var_shape: &[usize],
    rows: usize,
) -> Vec<usize> {
    let var_strides = strides(var_shape);
    // Stride contributed by each table axis, zero when the variable is
    // constant along it.
    let axis_stride: Vec<usize> = table_dims
        .iter()
        .map(|d| {
            var_dims
                .iter()
                .position(|v| v == d)
                .map(|p| var_strides[p])
                .unwrap_or(0)
        })
        .collect();
    let table_strides = strides(table_shape);

    (0..rows)
        .map(|row| {
            table_shape
                .iter()
                .enumerate()
                .map(|(axis, &n)| ((row / table_strides[axis]) % n) * axis_stride[axis])
                .sum()
        })
        .collect()
}

/// Lift a table into a one-dimensional dataset over [`INDEX_DIM`].
///
/// `time`, `lat` and `lon` columns become coordinates, with string-encoded
/// times parsed. Every other column becomes a data variable.
pub fn table_to_dataset(table: &ObservationTable) -> DatasetResult<LabeledArrayDataset> {
    let dims = vec![Dimension::new(INDEX_DIM, table.num_rows())];
    let mut coords = Vec::new();
    let mut data_vars = Vec::new();

    for col in table.columns() {
        let var = if col.name == TIME {
            let values = match &col.values {
                ArrayValues::Text(_) => ArrayValues::Time(col.values.to_datetimes()?),
                other => other.clone(),
            };
            Variable::new(col.name.clone(), vec![INDEX_DIM], values)
        } else {
            Variable::new(col.name.clone(), vec![INDEX_DIM], col.values.clone())
        };
        if [TIME, LAT, LON].contains(&col.name.as_str()) {
            coords.push(var);
        } else {
            data_vars.push(var);
        }
    }

    LabeledArrayDataset::new(dims, coords, data_vars)
}
