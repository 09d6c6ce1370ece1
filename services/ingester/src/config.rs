//! Ingester configuration, built once at startup from flags and environment.


use anyhow::{bail, Result};
use chrono::Datelike;
use ingestion::{IngestionConfig, SourceSpec};
use obs_dataset::BoundingWindow;
use storage::{Destination, Encoding, ObjectStorageConfig, WriterConfig};

use crate::Args;

/// Everything one run needs.
#[derive(Debug, Clone)]
pub struct IngesterConfig {
    pub ingestion: IngestionConfig,
    pub writer: WriterConfig,
    pub storage: ObjectStorageConfig,
    /// Years back from the current year included in the window.
    pub year_range: i32,
    /// Half-width of the window in degrees.
    pub loc_range: f64,
    /// Explicit point; the location provider is asked when absent.
    pub point: Option<(f64, f64)>,
    pub sources: Vec<SourceSpec>,
    pub encodings: Vec<Encoding>,
    pub destination: Destination,
}

impl IngesterConfig {
    pub fn from_args(args: &Args) -> Result<Self> {
        let ingestion = match &args.data_dir {
            Some(dir) => IngestionConfig::new(dir.clone()),
            None => IngestionConfig::from_env(),
        };
        let writer = WriterConfig::new(ingestion.processed_dir()).with_env();
        let storage = ObjectStorageConfig::from_env();

        let point = match (args.lon, args.lat) {
            (Some(lon), Some(lat)) => Some((lon, lat)),
            (None, None) => None,
            _ => bail!("--lon and --lat must be given together"),
        };

        let sources = if args.source.is_empty() {
            SourceSpec::all()
        } else {
            args.source
                .iter()
                .map(|name| match SourceSpec::by_name(name) {
                    Some(spec) => Ok(spec),
                    None => bail!("unknown source '{}' (expected co2 or tempanomalies)", name),
                })
                .collect::<Result<Vec<_>>>()?
        };

        let encodings = if args.encoding.is_empty() {
            vec![Encoding::Parquet]
        } else {
            args.encoding
                .iter()
                .map(|e| match Encoding::parse(e) {
                    Some(enc) => Ok(enc),
                    None => bail!("unknown encoding '{}' (expected csv, parquet or zarr)", e),
                })
                .collect::<Result<Vec<_>>>()?
        };

        let destination = if args.remote {
            Destination::ObjectStore {
                bucket: args.bucket.clone(),
            }
        } else {
            Destination::Local(ingestion.processed_dir())
        };

        if args.year_range < 0 {
            bail!("--year-range must not be negative");
        }
        if !(args.loc_range.is_finite() && args.loc_range >= 0.0) {
            bail!("--loc-range must be a non-negative number of degrees");
        }

        Ok(Self {
            ingestion,
            writer,
            storage,
            year_range: args.year_range,
            loc_range: args.loc_range,
            point,
            sources,
            encodings,
            destination,
        })
    }

    /// First year kept relative to `current_year`.
    pub fn year_from(&self, current_year: i32) -> i32 {
        current_year - self.year_range
    }

    /// Window around `(lon, lat)` starting this year minus the year range.
    pub fn window(&self, lon: f64, lat: f64) -> Result<BoundingWindow> {
        let current_year = chrono::Utc::now().year();
        Ok(BoundingWindow::around(
            lon,
            lat,
            self.loc_range,
            self.year_from(current_year),
        )?)
    }
}
