//! Where and how an artifact is persisted.

use std::path::PathBuf;

use obs_dataset::{LabeledArrayDataset, ObservationTable};
use serde::{Deserialize, Serialize};

/// Physical encoding of a processed artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Tab-separated rows with a header line.
    Csv,
    /// Columnar Parquet file.
    Parquet,
    /// Zarr V3 chunked-array directory.
    Zarr,
}

impl Encoding {
    /// File extension, also used in object keys.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Parquet => "parquet",
            Self::Zarr => "zarr",
        }
    }

    /// Parse from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "parquet" => Some(Self::Parquet),
            "zarr" => Some(Self::Zarr),
            _ => None,
        }
    }
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Target of a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// A local directory.
    Local(PathBuf),
    /// The configured object store, optionally overriding its bucket.
    ObjectStore { bucket: Option<String> },
}

impl Destination {
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::ObjectStore { .. })
    }
}

/// What is being persisted.
#[derive(Debug, Clone, Copy)]
pub enum Artifact<'a> {
    Table(&'a ObservationTable),
    Dataset(&'a LabeledArrayDataset),
}

impl Artifact<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Table(_) => "table",
            Self::Dataset(_) => "dataset",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_parse() {
        assert_eq!(Encoding::parse("CSV"), Some(Encoding::Csv));
        assert_eq!(Encoding::parse("parquet"), Some(Encoding::Parquet));
        assert_eq!(Encoding::parse("zarr"), Some(Encoding::Zarr));
        assert_eq!(Encoding::parse("netcdf"), None);
        assert_eq!(Encoding::Zarr.to_string(), "zarr");
    }
}
