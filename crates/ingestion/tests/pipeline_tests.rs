//! End-to-end ingestion over generated raw directories.

use ingestion::{IngestionConfig, IngestionError, Ingester, SourceSpec};
use obs_dataset::{ArrayValues, BoundingWindow, DataKind};
use test_utils::{
    anomaly_value, location, raw_dir, samples_around, temp_test_dir, write_grid_file,
    write_retrieval_file, GridFileSpec, RetrievalSample,
};

// ============================================================================
// CO2 retrievals
// ============================================================================

#[test]
fn test_co2_multiple_files_combined_and_windowed() {
    let root = temp_test_dir();
    let raw = raw_dir(&root);
    let (lon, lat) = location::BERLIN;

    write_retrieval_file(&raw.join("oco2_LtCO2_a.h5"), &samples_around(lon, lat)).unwrap();
    write_retrieval_file(
        &raw.join("oco2_LtCO2_b.h5"),
        &[
            RetrievalSample::new("2023-05-01T00:00:00Z", lat, lon, 0.000412),
            // Outside the box
            RetrievalSample::new("2023-05-01T00:00:00Z", -30.0, lon, 0.000413),
        ],
    )
    .unwrap();

    let ingester = Ingester::new(IngestionConfig::new(root.path()));
    let window = BoundingWindow::around(lon, lat, location::DEFAULT_RANGE, 2023).unwrap();
    let result = ingester.ingest(&SourceSpec::co2(), &window).unwrap();

    assert_eq!(result.files_read, 2);
    assert_eq!(result.table.column_names(), vec!["time", "lat", "lon", "xco2"]);
    // 2023 and 2024 soundings from file a, the in-box sounding from file b
    assert_eq!(result.table.num_rows(), 3);
    assert_eq!(
        result.table.column("time").unwrap().values.kind(),
        DataKind::Time
    );

    let xco2 = result.table.column("xco2").unwrap().values.to_f64_vec().unwrap();
    assert!((xco2[2] - 412.0).abs() < 1e-9);
}

#[test]
fn test_co2_empty_window_is_not_an_error() {
    let root = temp_test_dir();
    let raw = raw_dir(&root);
    let (lon, lat) = location::BERLIN;
    write_retrieval_file(&raw.join("oco2.h5"), &samples_around(lon, lat)).unwrap();

    let ingester = Ingester::new(IngestionConfig::new(root.path()));
    let (plon, plat) = location::PACIFIC;
    let window = BoundingWindow::around(plon, plat, 1.0, 2000).unwrap();
    let result = ingester.ingest(&SourceSpec::co2(), &window).unwrap();

    assert_eq!(result.table.num_rows(), 0);
    assert_eq!(result.table.num_columns(), 4);
}

// ============================================================================
// Temperature anomaly grids
// ============================================================================

#[test]
fn test_tempanomalies_concatenated_along_time() {
    let root = temp_test_dir();
    let raw = raw_dir(&root);
    write_grid_file(&raw.join("gistemp_2022.nc"), &GridFileSpec::small(2022, 12)).unwrap();
    write_grid_file(&raw.join("gistemp_2023.nc"), &GridFileSpec::small(2023, 12)).unwrap();

    let ingester = Ingester::new(IngestionConfig::new(root.path()));
    let (combined, files) = ingester.load_source(&SourceSpec::tempanomalies()).unwrap();
    assert_eq!(files, 2);
    assert_eq!(combined.dim_size("time"), Some(24));

    let window = BoundingWindow::new(2023, -10.0, 10.0, 105.0, 125.0).unwrap();
    let result = ingester.ingest(&SourceSpec::tempanomalies(), &window).unwrap();

    assert_eq!(
        result.table.column_names(),
        vec!["time", "lat", "lon", "tempanomaly"]
    );
    assert!(result.dataset.data_var("time_bnds").is_none());
    // 12 months × lats {-10, 0, 10} × lons {110, 120}
    assert_eq!(result.table.num_rows(), 12 * 3 * 2);

    let lat = result.table.column("lat").unwrap().values.to_f64_vec().unwrap();
    let lon = result.table.column("lon").unwrap().values.to_f64_vec().unwrap();
    assert!(lat.iter().all(|v| (-10.0..=10.0).contains(v)));
    assert!(lon.iter().all(|v| (105.0..=125.0).contains(v)));

    // First row is month 0 of the 2023 file at lat index 1, lon index 1
    let values = result.table.column("tempanomaly").unwrap().values.to_f64_vec().unwrap();
    assert!((values[0] - anomaly_value(0, 1, 1)).abs() < 1e-9);
}

#[test]
fn test_mismatched_grids_rejected() {
    let root = temp_test_dir();
    let raw = raw_dir(&root);
    write_grid_file(&raw.join("gistemp_a.nc"), &GridFileSpec::small(2022, 1)).unwrap();
    let mut other = GridFileSpec::small(2023, 1);
    other.lat.count = 3;
    write_grid_file(&raw.join("gistemp_b.nc"), &other).unwrap();

    let ingester = Ingester::new(IngestionConfig::new(root.path()));
    let err = ingester
        .load_source(&SourceSpec::tempanomalies())
        .unwrap_err();
    assert!(matches!(err, IngestionError::SchemaMismatch(_)));
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_no_input_files() {
    let root = temp_test_dir();
    raw_dir(&root);

    let ingester = Ingester::new(IngestionConfig::new(root.path()));
    let err = ingester.load_source(&SourceSpec::co2()).unwrap_err();
    assert!(matches!(err, IngestionError::NoInputFiles { pattern, .. } if pattern == "oco*.h5"));
}

#[test]
fn test_one_bad_file_aborts_combine() {
    let root = temp_test_dir();
    let raw = raw_dir(&root);
    write_retrieval_file(&raw.join("oco2_a.h5"), &samples_around(0.0, 0.0)).unwrap();
    std::fs::write(raw.join("oco2_b.h5"), b"not hdf5").unwrap();

    let ingester = Ingester::new(IngestionConfig::new(root.path()));
    let err = ingester.load_source(&SourceSpec::co2()).unwrap_err();
    match err {
        IngestionError::Format { path, .. } => assert!(path.ends_with("oco2_b.h5")),
        other => panic!("expected format error, got {other}"),
    }
}

#[test]
fn test_single_file_returned_unchanged() {
    let root = temp_test_dir();
    let raw = raw_dir(&root);
    write_retrieval_file(&raw.join("oco2.h5"), &samples_around(0.0, 0.0)).unwrap();

    let ingester = Ingester::new(IngestionConfig::new(root.path()));
    let (ds, _) = ingester.load_source(&SourceSpec::co2()).unwrap();
    assert!(matches!(ds.coord("time").unwrap().values, ArrayValues::Text(_)));
}

#[test]
fn test_single_file_table_has_parsed_times() {
    let root = temp_test_dir();
    let raw = raw_dir(&root);
    let (lon, lat) = location::BERLIN;
    write_retrieval_file(&raw.join("oco2.h5"), &samples_around(lon, lat)).unwrap();

    let ingester = Ingester::new(IngestionConfig::new(root.path()));
    let window = BoundingWindow::around(lon, lat, location::DEFAULT_RANGE, 2022).unwrap();
    let result = ingester.ingest(&SourceSpec::co2(), &window).unwrap();

    assert_eq!(result.files_read, 1);
    assert_eq!(result.table.num_rows(), 3);
    assert_eq!(
        result.table.column("time").unwrap().values.kind(),
        DataKind::Time
    );
}
