//! Chunk Planner: greedy halving toward a byte budget.

use serde::Serialize;
use tracing::debug;

use crate::dataset::{LabeledArrayDataset, Variable};
use crate::error::{DatasetError, DatasetResult};

/// Default chunk budget for chunked-array writes, in MiB.
pub const DEFAULT_TARGET_MB: usize = 5;

pub const BYTES_PER_MB: usize = 1024 * 1024;

/// Per-dimension chunk lengths, in the dimension order of the variable
/// that drove the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkPlan {
    chunks: Vec<(String, usize)>,
    item_size: usize,
}

impl ChunkPlan {
    /// Chunk length for `dim`, if the plan covers it.
    pub fn get(&self, dim: &str) -> Option<usize> {
        self.chunks
            .iter()
            .find(|(name, _)| name == dim)
            .map(|(_, len)| *len)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.chunks.iter().map(|(name, len)| (name.as_str(), *len))
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Bytes in one chunk of the driving variable.
    pub fn estimated_bytes(&self) -> usize {
        self.item_size * self.chunks.iter().map(|(_, len)| *len).product::<usize>()
    }

    /// Chunk shape for `var`: planned lengths where the plan covers a
    /// dimension, the full dimension size elsewhere. Never below 1.
    pub fn chunk_shape(&self, ds: &LabeledArrayDataset, var: &Variable) -> DatasetResult<Vec<usize>> {
        let shape = ds.shape_of(var)?;
        Ok(var
            .dims
            .iter()
            .zip(shape)
            .map(|(dim, size)| self.get(dim).unwrap_or(size).min(size).max(1))
            .collect())
    }
}

/// Plan chunk lengths so one chunk of the largest data variable fits in
/// `target_bytes`.
///
/// The largest variable (by byte footprint, first on ties) defines the
/// dimensions. Starting from full sizes, the largest candidate (first on
/// ties) is halved until the estimate fits or every length is 1.
/// Zero-length dimensions plan a length of 1.
pub fn plan_chunks(ds: &LabeledArrayDataset, target_bytes: usize) -> DatasetResult<ChunkPlan> {
    let mut largest: Option<&Variable> = None;
    for var in ds.data_vars() {
        if largest.map_or(true, |l| var.values.nbytes() > l.values.nbytes()) {
            largest = Some(var);
        }
    }
    let var = largest.ok_or_else(|| DatasetError::invalid("no data variables to plan chunks for"))?;

    let item_size = var.values.item_size();
    let mut candidates: Vec<usize> = ds.shape_of(var)?.into_iter().map(|n| n.max(1)).collect();

    loop {
        let estimate = item_size * candidates.iter().product::<usize>();
        if estimate <= target_bytes {
            break;
        }
        let max = candidates.iter().copied().max().unwrap_or(1);
        if max <= 1 {
            break;
        }
        // position() returns the first match, so ties go to the earliest dim
        if let Some(i) = candidates.iter().position(|&c| c == max) {
            candidates[i] = max / 2;
        }
    }

    let plan = ChunkPlan {
        chunks: var.dims.iter().cloned().zip(candidates).collect(),
        item_size,
    };

    debug!(
        variable = %var.name,
        target_bytes = target_bytes,
        estimated_bytes = plan.estimated_bytes(),
        chunks = ?plan.chunks,
        "Planned chunks"
    );

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dimension;
    use crate::values::ArrayValues;

    fn cube(lat: usize, lon: usize, time: usize) -> LabeledArrayDataset {
        LabeledArrayDataset::new(
            vec![
                Dimension::new("lat", lat),
                Dimension::new("lon", lon),
                Dimension::new("time", time),
            ],
            vec![],
            vec![Variable::new(
                "v",
                vec!["lat", "lon", "time"],
                ArrayValues::Float64(vec![0.0; lat * lon * time]),
            )],
        )
        .unwrap()
    }

    #[test]
    fn test_one_mib_example() {
        let plan = plan_chunks(&cube(100, 100, 1000), BYTES_PER_MB).unwrap();
        assert_eq!(plan.get("lat"), Some(50));
        assert_eq!(plan.get("lon"), Some(50));
        assert_eq!(plan.get("time"), Some(31));
        assert!(plan.estimated_bytes() <= BYTES_PER_MB);
    }

    #[test]
    fn test_small_array_keeps_full_sizes() {
        let plan = plan_chunks(&cube(2, 3, 4), BYTES_PER_MB).unwrap();
        assert_eq!(plan.iter().collect::<Vec<_>>(), vec![("lat", 2), ("lon", 3), ("time", 4)]);
    }

    #[test]
    fn test_tiny_budget_degrades_to_ones() {
        let plan = plan_chunks(&cube(4, 4, 4), 1).unwrap();
        assert!(plan.iter().all(|(_, len)| len == 1));
    }

    #[test]
    fn test_first_largest_variable_wins() {
        let ds = LabeledArrayDataset::new(
            vec![Dimension::new("a", 4), Dimension::new("b", 4)],
            vec![],
            vec![
                Variable::new("first", vec!["a"], ArrayValues::Float64(vec![0.0; 4])),
                Variable::new("second", vec!["b"], ArrayValues::Float64(vec![0.0; 4])),
            ],
        )
        .unwrap();
        let plan = plan_chunks(&ds, 1024).unwrap();
        assert_eq!(plan.get("a"), Some(4));
        assert_eq!(plan.get("b"), None);
    }

    #[test]
    fn test_zero_length_dimension_planned_as_one() {
        let plan = plan_chunks(&cube(0, 10, 10), BYTES_PER_MB).unwrap();
        assert_eq!(plan.get("lat"), Some(1));
    }
}
