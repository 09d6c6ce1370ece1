//! Ingestion configuration: data directories and canonical sources.

use std::path::PathBuf;

use hdf5_parser::RETRIEVAL_DIM;
use obs_dataset::TIME;
use serde::{Deserialize, Serialize};

use crate::metadata::FormatTag;

/// Data directory layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// Root holding `raw/` inputs and `processed/` artifacts.
    pub data_dir: PathBuf,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
        }
    }
}

impl IngestionConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("DATA_DIR") {
            if !val.is_empty() {
                config.data_dir = PathBuf::from(val);
            }
        }

        config
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.data_dir.join("raw")
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.data_dir.join("processed")
    }
}

/// One canonical observation source: which files to pick up, how to read
/// them and which variable to keep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpec {
    /// Artifact name, also used for processed file names.
    pub name: String,
    pub format: FormatTag,
    pub file_prefix: String,
    pub extension: String,
    /// Measured variable projected into the table.
    pub variable: String,
    /// Dimension per-file datasets are concatenated along.
    pub concat_dim: String,
}

impl SourceSpec {
    /// OCO-2 column CO2 retrievals.
    pub fn co2() -> Self {
        Self {
            name: "co2".to_string(),
            format: FormatTag::HierarchicalBinary,
            file_prefix: "oco".to_string(),
            extension: "h5".to_string(),
            variable: "xco2".to_string(),
            concat_dim: RETRIEVAL_DIM.to_string(),
        }
    }

    /// GISTEMP surface temperature anomalies.
    pub fn tempanomalies() -> Self {
        Self {
            name: "tempanomalies".to_string(),
            format: FormatTag::GridArray,
            file_prefix: "gistemp".to_string(),
            extension: "nc".to_string(),
            variable: "tempanomaly".to_string(),
            concat_dim: TIME.to_string(),
        }
    }

    /// Canonical source by artifact name.
    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "co2" => Some(Self::co2()),
            "tempanomalies" => Some(Self::tempanomalies()),
            _ => None,
        }
    }

    /// All canonical sources.
    pub fn all() -> Vec<Self> {
        vec![Self::co2(), Self::tempanomalies()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directories() {
        let config = IngestionConfig::new("/srv/data");
        assert_eq!(config.raw_dir(), PathBuf::from("/srv/data/raw"));
        assert_eq!(config.processed_dir(), PathBuf::from("/srv/data/processed"));
    }

    #[test]
    fn test_canonical_sources() {
        let co2 = SourceSpec::by_name("co2").unwrap();
        assert_eq!(co2.format, FormatTag::HierarchicalBinary);
        assert_eq!(co2.concat_dim, "retrieval");

        let temp = SourceSpec::by_name("tempanomalies").unwrap();
        assert_eq!(temp.format, FormatTag::GridArray);
        assert_eq!(temp.variable, "tempanomaly");

        assert!(SourceSpec::by_name("ch4").is_none());
    }
}
