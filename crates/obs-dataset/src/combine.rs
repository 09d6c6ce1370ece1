//! Dataset Combiner: concatenation of per-file datasets along one dimension.

use tracing::debug;

use crate::dataset::{LabeledArrayDataset, Variable, TIME};
use crate::error::{DatasetError, DatasetResult};
use crate::values::ArrayValues;

/// Concatenate `datasets` along `dim`, in the order given.
///
/// A single input is returned unchanged. Otherwise every input must share
/// the same non-concatenated dimensions, coordinates and data variables.
/// Variables that do not span `dim` must be identical across inputs. After
/// concatenation a string-encoded `time` coordinate is parsed into
/// timestamps.
pub fn combine(datasets: &[LabeledArrayDataset], dim: &str) -> DatasetResult<LabeledArrayDataset> {
    let (first, rest) = datasets
        .split_first()
        .ok_or_else(|| DatasetError::invalid("combine requires at least one dataset"))?;

    if rest.is_empty() {
        return Ok(first.clone());
    }

    for (i, ds) in datasets.iter().enumerate() {
        if ds.dim_size(dim).is_none() {
            return Err(DatasetError::schema_mismatch(format!(
                "input {} has no dimension '{}'",
                i, dim
            )));
        }
    }
    for (i, ds) in rest.iter().enumerate() {
        check_schema(first, ds, dim).map_err(|e| match e {
            DatasetError::SchemaMismatch(msg) => {
                DatasetError::schema_mismatch(format!("input {}: {}", i + 1, msg))
            }
            other => other,
        })?;
    }

    let lengths: Vec<usize> = datasets
        .iter()
        .map(|ds| ds.dim_size(dim).unwrap_or(0))
        .collect();
    let total: usize = lengths.iter().sum();

    let dims = first
        .dims()
        .iter()
        .map(|d| {
            let mut d = d.clone();
            if d.name == dim {
                d.size = total;
            }
            d
        })
        .collect();

    let coords = first
        .coords()
        .iter()
        .map(|c| concat_variable(datasets, c, dim, &lengths, |ds| ds.coord(&c.name)))
        .collect::<DatasetResult<Vec<_>>>()?;
    let data_vars = first
        .data_vars()
        .iter()
        .map(|v| concat_variable(datasets, v, dim, &lengths, |ds| ds.data_var(&v.name)))
        .collect::<DatasetResult<Vec<_>>>()?;

    let combined =
        LabeledArrayDataset::new(dims, coords, data_vars)?.with_attrs(first.attrs().clone());
    let combined = normalize_time(combined)?;

    debug!(
        inputs = datasets.len(),
        dim = dim,
        length = total,
        "Combined datasets"
    );

    Ok(combined)
}

fn check_schema(
    expected: &LabeledArrayDataset,
    actual: &LabeledArrayDataset,
    dim: &str,
) -> DatasetResult<()> {
    let fixed = |ds: &LabeledArrayDataset| -> Vec<(String, usize)> {
        ds.dims()
            .iter()
            .filter(|d| d.name != dim)
            .map(|d| (d.name.clone(), d.size))
            .collect()
    };
    if fixed(expected) != fixed(actual) {
        return Err(DatasetError::schema_mismatch(format!(
            "dimensions {:?} differ from {:?}",
            fixed(actual),
            fixed(expected)
        )));
    }

    let names = |vars: &[Variable]| -> Vec<String> { vars.iter().map(|v| v.name.clone()).collect() };
    if names(expected.data_vars()) != names(actual.data_vars()) {
        return Err(DatasetError::schema_mismatch(format!(
            "data variables {:?} differ from {:?}",
            names(actual.data_vars()),
            names(expected.data_vars())
        )));
    }
    if names(expected.coords()) != names(actual.coords()) {
        return Err(DatasetError::schema_mismatch(format!(
            "coordinates {:?} differ from {:?}",
            names(actual.coords()),
            names(expected.coords())
        )));
    }

    Ok(())
}

fn concat_variable<'a, F>(
    datasets: &'a [LabeledArrayDataset],
    template: &Variable,
    dim: &str,
    lengths: &[usize],
    lookup: F,
) -> DatasetResult<Variable>
where
    F: Fn(&'a LabeledArrayDataset) -> Option<&'a Variable>,
{
    let parts = datasets
        .iter()
        .map(|ds| {
            let var = lookup(ds).ok_or_else(|| {
                DatasetError::schema_mismatch(format!("variable '{}' missing", template.name))
            })?;
            if var.dims != template.dims {
                return Err(DatasetError::schema_mismatch(format!(
                    "variable '{}' declared over {:?}, expected {:?}",
                    template.name, var.dims, template.dims
                )));
            }
            Ok(var)
        })
        .collect::<DatasetResult<Vec<_>>>()?;

    let Some(axis) = template.dims.iter().position(|d| d == dim) else {
        if parts.iter().any(|v| v.values != template.values) {
            return Err(DatasetError::schema_mismatch(format!(
                "variable '{}' does not span '{}' and differs between inputs",
                template.name, dim
            )));
        }
        return Ok(template.clone());
    };

    let mut flat = template.values.take(&[]);
    for part in &parts {
        flat.extend_from(&part.values)?;
    }

    // Values are row-major, so only axis 0 can be appended directly.
    let values = if axis == 0 {
        flat
    } else {
        let shape = datasets[0].shape_of(template)?;
        let outer: usize = shape[..axis].iter().product();
        let inner: usize = shape[axis + 1..].iter().product();
        flat.take(&interleave_order(outer, inner, lengths))
    };

    Ok(Variable {
        values,
        ..template.clone()
    })
}

/// Flat gather order that interleaves inputs appended end to end so that
/// the concatenated axis sits between `outer` and `inner`.
fn interleave_order(outer: usize, inner: usize, lengths: &[usize]) -> Vec<usize> {
    let mut bases = Vec::with_capacity(lengths.len());
    let mut offset = 0;
    for &n in lengths {
        bases.push(offset);
        offset += outer * n * inner;
    }

    let mut order = Vec::with_capacity(offset);
    for o in 0..outer {
        for (base, &n) in bases.iter().zip(lengths) {
            let block = n * inner;
            let start = base + o * block;
            order.extend(start..start + block);
        }
    }
    order
}

/// Parse a string-encoded `time` coordinate into timestamps. Datasets
/// without one, or already holding timestamps, pass through.
pub fn normalize_time(ds: LabeledArrayDataset) -> DatasetResult<LabeledArrayDataset> {
    match ds.coord(TIME).map(|c| &c.values) {
        Some(values @ ArrayValues::Text(_)) => {
            let times = values.to_datetimes()?;
            ds.replace_coord_values(TIME, ArrayValues::Time(times))
        }
        _ => Ok(ds),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dimension;

    fn samples(lat: Vec<f64>, times: Vec<&str>) -> LabeledArrayDataset {
        let n = lat.len();
        LabeledArrayDataset::new(
            vec![Dimension::new("retrieval", n)],
            vec![
                Variable::new(
                    "time",
                    vec!["retrieval"],
                    ArrayValues::Text(times.into_iter().map(String::from).collect()),
                ),
                Variable::new("lat", vec!["retrieval"], ArrayValues::Float64(lat)),
            ],
            vec![Variable::new(
                "xco2",
                vec!["retrieval"],
                ArrayValues::Float64(vec![400.0; n]),
            )],
        )
        .unwrap()
    }

    #[test]
    fn test_single_input_is_identity() {
        let ds = samples(vec![1.0], vec!["2020-01-01T00:00:00Z"]);
        let out = combine(std::slice::from_ref(&ds), "retrieval").unwrap();
        assert_eq!(out, ds);
    }

    #[test]
    fn test_concat_parses_time_strings() {
        let a = samples(vec![1.0, 2.0], vec!["2020-01-01T00:00:00Z", "2020-01-02T00:00:00Z"]);
        let b = samples(vec![3.0], vec!["2021-05-05T05:05:05+01:00"]);
        let out = combine(&[a, b], "retrieval").unwrap();

        assert_eq!(out.dim_size("retrieval"), Some(3));
        assert_eq!(
            out.coord("lat").unwrap().values,
            ArrayValues::Float64(vec![1.0, 2.0, 3.0])
        );
        match &out.coord("time").unwrap().values {
            ArrayValues::Time(t) => assert_eq!(t[2].to_string(), "2021-05-05 04:05:05"),
            other => panic!("unexpected time kind {}", other.kind()),
        }
    }

    #[test]
    fn test_concat_inner_axis() {
        let grid = |t: Vec<i64>, v: Vec<f64>| {
            LabeledArrayDataset::new(
                vec![Dimension::new("lat", 2), Dimension::new("time", t.len())],
                vec![Variable::new("time", vec!["time"], ArrayValues::Int64(t))],
                vec![Variable::new("v", vec!["lat", "time"], ArrayValues::Float64(v))],
            )
            .unwrap()
        };
        let a = grid(vec![0], vec![1.0, 2.0]);
        let b = grid(vec![1, 2], vec![10.0, 11.0, 20.0, 21.0]);
        let out = combine(&[a, b], "time").unwrap();
        assert_eq!(
            out.data_var("v").unwrap().values,
            ArrayValues::Float64(vec![1.0, 10.0, 11.0, 2.0, 20.0, 21.0])
        );
    }

    #[test]
    fn test_mismatched_variables_rejected() {
        let a = samples(vec![1.0], vec!["2020-01-01"]);
        let b = LabeledArrayDataset::new(
            vec![Dimension::new("retrieval", 1)],
            vec![],
            vec![Variable::new("other", vec!["retrieval"], ArrayValues::Float64(vec![1.0]))],
        )
        .unwrap();
        assert!(matches!(
            combine(&[a, b], "retrieval"),
            Err(DatasetError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(combine(&[], "time").is_err());
    }
}
