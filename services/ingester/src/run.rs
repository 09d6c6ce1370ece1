//! One ingestion run: every configured source, every configured encoding.

use anyhow::{Context, Result};
use ingestion::{Ingester, IngestionResult, SourceSpec};
use obs_dataset::BoundingWindow;
use storage::{PersistenceWriter, WriteResult, CO2_ARTIFACT};
use tracing::info;

use crate::config::IngesterConfig;
use crate::location::LocationProvider;

/// What a run produced.
#[derive(Debug)]
pub struct RunSummary {
    pub window: BoundingWindow,
    /// `(source, rows)` per ingested source.
    pub rows: Vec<(String, usize)>,
    pub writes: Vec<WriteResult>,
}

/// Resolve the point, then ingest and persist each source in turn.
///
/// The first failing source aborts the run.
pub async fn run(config: &IngesterConfig, location: &dyn LocationProvider) -> Result<RunSummary> {
    let (lon, lat) = match config.point {
        Some(point) => point,
        None => location
            .locate()
            .await
            .context("no --lon/--lat given and the location provider failed")?,
    };
    let window = config.window(lon, lat)?;
    info!(
        lon = lon,
        lat = lat,
        year_from = window.year_from,
        range = config.loc_range,
        "Selection window"
    );

    let writer = PersistenceWriter::new(config.writer.clone(), config.storage.clone())?;

    let mut rows = Vec::new();
    let mut writes = Vec::new();
    for source in &config.sources {
        let result = ingest_source(config, source, window).await?;
        rows.push((result.source.clone(), result.table.num_rows()));

        for &encoding in &config.encodings {
            let written = if source.name == CO2_ARTIFACT {
                writer
                    .write_co2(&result.table, &config.destination, encoding)
                    .await
            } else {
                writer
                    .write_tempanomalies(&result.table, &result.dataset, &config.destination, encoding)
                    .await
            };
            writes.push(written.with_context(|| format!("writing {} as {}", source.name, encoding))?);
        }
    }

    Ok(RunSummary {
        window,
        rows,
        writes,
    })
}

/// The pipeline is synchronous file I/O, so it runs on the blocking pool.
async fn ingest_source(
    config: &IngesterConfig,
    source: &SourceSpec,
    window: BoundingWindow,
) -> Result<IngestionResult> {
    let ingester = Ingester::new(config.ingestion.clone());
    let spec = source.clone();
    let result = tokio::task::spawn_blocking(move || ingester.ingest(&spec, &window))
        .await?
        .with_context(|| format!("ingesting {}", source.name))?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::{FixedLocation, LocationError};
    use async_trait::async_trait;
    use clap::Parser;
    use storage::{load_csv, load_parquet};
    use test_utils::{raw_dir, samples_around, write_grid_file, write_retrieval_file, GridFileSpec};

    struct NoLocation;

    #[async_trait]
    impl LocationProvider for NoLocation {
        async fn locate(&self) -> Result<(f64, f64), LocationError> {
            Err(LocationError::Missing("INGESTER_LON"))
        }
    }

    fn config_for(root: &std::path::Path, extra: &[&str]) -> IngesterConfig {
        let root = root.to_string_lossy().into_owned();
        let mut argv = vec!["ingester", "--data-dir", root.as_str()];
        argv.extend_from_slice(extra);
        IngesterConfig::from_args(&crate::Args::parse_from(argv)).unwrap()
    }

    #[tokio::test]
    async fn test_run_persists_both_sources() {
        let root = tempfile::tempdir().unwrap();
        let raw = raw_dir(&root);
        let current = chrono::Datelike::year(&chrono::Utc::now());
        write_grid_file(&raw.join("gistemp.nc"), &GridFileSpec::small(current, 12)).unwrap();
        write_retrieval_file(&raw.join("oco2.h5"), &samples_around(110.0, 0.0)).unwrap();

        let config = config_for(
            root.path(),
            &["--encoding", "csv", "--encoding", "parquet", "--year-range", "0"],
        );
        let location = FixedLocation { lon: 110.0, lat: 0.0 };
        let summary = run(&config, &location).await.unwrap();

        assert_eq!(summary.writes.len(), 4);
        // 12 months over lats -10..10 and lons 100..120
        assert!(summary.rows.contains(&("tempanomalies".to_string(), 12 * 3 * 3)));

        let processed = root.path().join("processed");
        let temp = load_parquet(&processed, "tempanomalies").unwrap();
        assert_eq!(temp.num_rows(), 108);
        let co2 = load_csv(&processed, "co2").unwrap();
        assert_eq!(co2.column_names(), vec!["time", "lat", "lon", "xco2"]);
    }

    #[tokio::test]
    async fn test_missing_location_fails() {
        let root = tempfile::tempdir().unwrap();
        let config = config_for(root.path(), &[]);
        assert!(run(&config, &NoLocation).await.is_err());
    }
}
