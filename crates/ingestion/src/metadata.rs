//! Raw input file descriptors.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// On-disk layout of a raw observation file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormatTag {
    /// Self-describing dimensions/coordinates/variables on a grid (NetCDF)
    GridArray,
    /// Nested groups of per-sample datasets (HDF5)
    HierarchicalBinary,
}

impl FormatTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GridArray => "grid-array",
            Self::HierarchicalBinary => "hierarchical-binary",
        }
    }
}

impl std::fmt::Display for FormatTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An immutable raw file awaiting a single read.
///
/// `variables` lists the data variables the reader must find in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawObservationFile {
    pub format: FormatTag,
    pub path: PathBuf,
    pub variables: Vec<String>,
}

impl RawObservationFile {
    pub fn new(format: FormatTag, path: impl Into<PathBuf>, variables: Vec<String>) -> Self {
        Self {
            format,
            path: path.into(),
            variables,
        }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name() {
        let file = RawObservationFile::new(
            FormatTag::HierarchicalBinary,
            "raw/oco2_LtCO2_220314.h5",
            vec!["xco2".into()],
        );
        assert_eq!(file.file_name(), "oco2_LtCO2_220314.h5");
    }

    #[test]
    fn test_format_tag_names() {
        assert_eq!(FormatTag::GridArray.to_string(), "grid-array");
        assert_eq!(FormatTag::HierarchicalBinary.as_str(), "hierarchical-binary");
    }
}
