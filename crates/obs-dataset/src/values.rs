//! Typed flat storage for coordinate and variable values.
//!
//! Multi-dimensional arrays are stored row-major (last dimension varies
//! fastest), so every reshaping operation in this crate is expressed as a
//! gather over flat indices via [`ArrayValues::take`].

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{DatasetError, DatasetResult};
use crate::time::parse_timestamp;

/// Element type of an [`ArrayValues`] buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataKind {
    Float64,
    Float32,
    Int64,
    /// Timezone-naive timestamps (UTC clock).
    Time,
    /// Encoded strings, typically raw timestamps before normalization.
    Text,
}

impl DataKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Float64 => "float64",
            Self::Float32 => "float32",
            Self::Int64 => "int64",
            Self::Time => "datetime64",
            Self::Text => "string",
        }
    }
}

impl std::fmt::Display for DataKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Flat, homogeneously typed value buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayValues {
    Float64(Vec<f64>),
    Float32(Vec<f32>),
    Int64(Vec<i64>),
    Time(Vec<NaiveDateTime>),
    Text(Vec<String>),
}

impl ArrayValues {
    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            Self::Float64(v) => v.len(),
            Self::Float32(v) => v.len(),
            Self::Int64(v) => v.len(),
            Self::Time(v) => v.len(),
            Self::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> DataKind {
        match self {
            Self::Float64(_) => DataKind::Float64,
            Self::Float32(_) => DataKind::Float32,
            Self::Int64(_) => DataKind::Int64,
            Self::Time(_) => DataKind::Time,
            Self::Text(_) => DataKind::Text,
        }
    }

    /// Size of one element in bytes.
    ///
    /// Text uses the longest encoded string, matching a fixed-width byte
    /// string layout.
    pub fn item_size(&self) -> usize {
        match self {
            Self::Float64(_) | Self::Int64(_) | Self::Time(_) => 8,
            Self::Float32(_) => 4,
            Self::Text(v) => v.iter().map(String::len).max().unwrap_or(0).max(1),
        }
    }

    /// Total byte footprint (`len × item_size`).
    pub fn nbytes(&self) -> usize {
        self.len() * self.item_size()
    }

    /// Gather the elements at `indices`, in order.
    ///
    /// Indices must be in bounds; callers derive them from the array shape.
    pub fn take(&self, indices: &[usize]) -> Self {
        match self {
            Self::Float64(v) => Self::Float64(indices.iter().map(|&i| v[i]).collect()),
            Self::Float32(v) => Self::Float32(indices.iter().map(|&i| v[i]).collect()),
            Self::Int64(v) => Self::Int64(indices.iter().map(|&i| v[i]).collect()),
            Self::Time(v) => Self::Time(indices.iter().map(|&i| v[i]).collect()),
            Self::Text(v) => Self::Text(indices.iter().map(|&i| v[i].clone()).collect()),
        }
    }

    /// Append `other` to the end of this buffer. Both must share a kind.
    pub fn extend_from(&mut self, other: &ArrayValues) -> DatasetResult<()> {
        match (self, other) {
            (Self::Float64(a), Self::Float64(b)) => a.extend_from_slice(b),
            (Self::Float32(a), Self::Float32(b)) => a.extend_from_slice(b),
            (Self::Int64(a), Self::Int64(b)) => a.extend_from_slice(b),
            (Self::Time(a), Self::Time(b)) => a.extend_from_slice(b),
            (Self::Text(a), Self::Text(b)) => a.extend_from_slice(b),
            (a, b) => {
                return Err(DatasetError::schema_mismatch(format!(
                    "cannot concatenate {} values with {} values",
                    a.kind(),
                    b.kind()
                )))
            }
        }
        Ok(())
    }

    /// Numeric view of element `i`, if the buffer is numeric.
    pub fn get_f64(&self, i: usize) -> Option<f64> {
        match self {
            Self::Float64(v) => v.get(i).copied(),
            Self::Float32(v) => v.get(i).map(|&x| x as f64),
            Self::Int64(v) => v.get(i).map(|&x| x as f64),
            Self::Time(_) | Self::Text(_) => None,
        }
    }

    /// Numeric copy of the whole buffer.
    pub fn to_f64_vec(&self) -> DatasetResult<Vec<f64>> {
        match self {
            Self::Float64(v) => Ok(v.clone()),
            Self::Float32(v) => Ok(v.iter().map(|&x| x as f64).collect()),
            Self::Int64(v) => Ok(v.iter().map(|&x| x as f64).collect()),
            other => Err(DatasetError::invalid(format!(
                "expected numeric values, found {}",
                other.kind()
            ))),
        }
    }

    /// Timestamps for the whole buffer, parsing encoded strings when needed.
    pub fn to_datetimes(&self) -> DatasetResult<Vec<NaiveDateTime>> {
        match self {
            Self::Time(v) => Ok(v.clone()),
            Self::Text(v) => v
                .iter()
                .map(|s| parse_timestamp(s).map_err(DatasetError::from))
                .collect(),
            other => Err(DatasetError::invalid(format!(
                "expected time values, found {}",
                other.kind()
            ))),
        }
    }

    /// True when every element is less than or equal to its successor.
    ///
    /// Non-numeric buffers report false.
    pub fn is_sorted_ascending(&self) -> bool {
        match self {
            Self::Float64(v) => v.windows(2).all(|w| w[0] <= w[1]),
            Self::Float32(v) => v.windows(2).all(|w| w[0] <= w[1]),
            Self::Int64(v) => v.windows(2).all(|w| w[0] <= w[1]),
            Self::Time(v) => v.windows(2).all(|w| w[0] <= w[1]),
            Self::Text(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_preserves_order() {
        let values = ArrayValues::Float64(vec![10.0, 11.0, 12.0, 13.0]);
        assert_eq!(
            values.take(&[3, 0, 0]),
            ArrayValues::Float64(vec![13.0, 10.0, 10.0])
        );
    }

    #[test]
    fn test_extend_rejects_mixed_kinds() {
        let mut a = ArrayValues::Float64(vec![1.0]);
        let b = ArrayValues::Int64(vec![2]);
        assert!(matches!(
            a.extend_from(&b),
            Err(DatasetError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_item_size() {
        assert_eq!(ArrayValues::Float32(vec![1.0]).item_size(), 4);
        assert_eq!(ArrayValues::Float64(vec![]).item_size(), 8);
        let text = ArrayValues::Text(vec!["ab".into(), "abcd".into()]);
        assert_eq!(text.item_size(), 4);
        assert_eq!(text.nbytes(), 8);
    }

    #[test]
    fn test_text_to_datetimes() {
        let values = ArrayValues::Text(vec!["2020-03-01T12:00:00Z".into()]);
        let times = values.to_datetimes().unwrap();
        assert_eq!(times[0].to_string(), "2020-03-01 12:00:00");
    }

    #[test]
    fn test_sorted_ascending() {
        assert!(ArrayValues::Float64(vec![-1.0, 0.0, 0.0, 2.0]).is_sorted_ascending());
        assert!(!ArrayValues::Float64(vec![2.0, 1.0]).is_sorted_ascending());
    }
}
