//! Satellite observation ingester.
//!
//! Reads raw OCO-2 retrievals and GISTEMP anomaly grids from the data
//! directory, narrows them to a window around a point and persists the
//! results locally or in object storage.

mod config;
mod location;
mod run;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use config::IngesterConfig;
use location::EnvLocationProvider;

#[derive(Parser, Debug)]
#[command(name = "ingester")]
#[command(about = "Ingest satellite observations around a point")]
pub struct Args {
    /// Years back from the current year to keep
    #[arg(long, default_value_t = 1, env = "INGESTER_YEAR_RANGE")]
    year_range: i32,

    /// Longitude of the window centre (asks the location provider when omitted)
    #[arg(long, allow_hyphen_values = true)]
    lon: Option<f64>,

    /// Latitude of the window centre
    #[arg(long, allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Half-width of the window in degrees
    #[arg(long, default_value_t = 10.0, env = "INGESTER_LOC_RANGE")]
    loc_range: f64,

    /// Data directory holding raw/ and processed/ (default: $DATA_DIR or ./data)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Output encoding: csv, parquet or zarr (repeatable)
    #[arg(long)]
    encoding: Vec<String>,

    /// Write to object storage instead of the local processed directory
    #[arg(long)]
    remote: bool,

    /// Bucket for remote writes (default: $S3_BUCKET)
    #[arg(long)]
    bucket: Option<String>,

    /// Source to ingest: co2 or tempanomalies (repeatable, default: both)
    #[arg(long)]
    source: Vec<String>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    netcdf_parser::silence_hdf5_errors();

    let config = IngesterConfig::from_args(&args)?;
    info!(
        data_dir = %config.ingestion.data_dir.display(),
        sources = ?config.sources.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
        encodings = ?config.encodings,
        remote = config.destination.is_remote(),
        "Starting satellite observation ingester"
    );

    let summary = run::run(&config, &EnvLocationProvider).await?;

    for write in &summary.writes {
        info!(
            location = %write.location,
            bytes = write.bytes_written,
            "Artifact written"
        );
    }
    info!(
        year_from = summary.window.year_from,
        rows = ?summary.rows,
        "Ingestion completed"
    );

    Ok(())
}
