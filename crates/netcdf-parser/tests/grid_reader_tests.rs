//! Reading GISTEMP-shaped grid files.

use netcdf_parser::{read_grid_file, NetCdfError};
use obs_dataset::{plan_chunks, ArrayValues, DataKind};
use test_utils::{anomaly_value, temp_test_dir, write_grid_file, GridFileSpec};

#[test]
fn test_native_layout_preserved() {
    let dir = temp_test_dir();
    let path = dir.path().join("gistemp1200_GHCNv4_ERSSTv5.nc");
    let spec = GridFileSpec::small(2021, 3);
    write_grid_file(&path, &spec).unwrap();

    let ds = read_grid_file(&path, &["tempanomaly"]).unwrap();

    let dims: Vec<(&str, usize)> = ds.dims().iter().map(|d| (d.name.as_str(), d.size)).collect();
    assert_eq!(dims, vec![("time", 3), ("lat", 5), ("lon", 4), ("nv", 2)]);

    let var = ds.data_var("tempanomaly").unwrap();
    assert_eq!(var.dims, vec!["time", "lat", "lon"]);
    assert_eq!(var.units(), Some("K"));
    assert!(ds.data_var("time_bnds").is_some());
    assert_eq!(ds.attrs().get("title").map(String::as_str), Some("GISTEMP fixture"));
}

#[test]
fn test_packed_values_unpacked() {
    let dir = temp_test_dir();
    let path = dir.path().join("gistemp.nc");
    let mut spec = GridFileSpec::small(2021, 2);
    spec.fill_cells = vec![0];
    write_grid_file(&path, &spec).unwrap();

    let ds = read_grid_file(&path, &["tempanomaly"]).unwrap();
    let values = ds.data_var("tempanomaly").unwrap().values.to_f64_vec().unwrap();

    assert!(values[0].is_nan());
    // (t=1, y=2, x=3) sits at 1*20 + 2*4 + 3
    assert!((values[31] - anomaly_value(1, 2, 3)).abs() < 1e-9);
}

#[test]
fn test_element_types_follow_file() {
    let dir = temp_test_dir();
    let path = dir.path().join("gistemp.nc");
    write_grid_file(&path, &GridFileSpec::small(2021, 4)).unwrap();

    let ds = read_grid_file(&path, &["tempanomaly"]).unwrap();

    // short packed with a float scale_factor decodes to single precision
    let anomaly = ds.data_var("tempanomaly").unwrap();
    assert_eq!(anomaly.values.kind(), DataKind::Float32);
    assert_eq!(anomaly.values.item_size(), 4);
    assert_eq!(ds.data_var("time_bnds").unwrap().values.kind(), DataKind::Float64);
    assert_eq!(ds.coord("lat").unwrap().values.kind(), DataKind::Float64);

    // 4 × 5 × 4 cells at 4 bytes each
    let plan = plan_chunks(&ds, 1 << 20).unwrap();
    assert_eq!(plan.estimated_bytes(), 4 * 5 * 4 * 4);
}

#[test]
fn test_time_fill_value_is_format_error() {
    let dir = temp_test_dir();
    let path = dir.path().join("gistemp.nc");
    {
        let mut file = netcdf::create(&path).unwrap();
        file.add_dimension("time", 2).unwrap();
        let mut time = file.add_variable::<f64>("time", &["time"]).unwrap();
        time.put_attribute("units", "days since 1800-01-01").unwrap();
        time.put_values(&[80_000.0, 9.96921e36], ..).unwrap();
    }

    let err = read_grid_file(&path, &[]).unwrap_err();
    assert!(matches!(err, NetCdfError::InvalidFormat(msg) if msg.contains("time")));
}

#[test]
fn test_cf_time_decoded() {
    let dir = temp_test_dir();
    let path = dir.path().join("gistemp.nc");
    write_grid_file(&path, &GridFileSpec::small(2022, 13)).unwrap();

    let ds = read_grid_file(&path, &[]).unwrap();
    let time = ds.coord("time").unwrap();
    assert_eq!(time.values.kind(), DataKind::Time);
    match &time.values {
        ArrayValues::Time(t) => {
            assert_eq!(t[0].to_string(), "2022-01-15 00:00:00");
            assert_eq!(t[12].to_string(), "2023-01-15 00:00:00");
        }
        other => panic!("unexpected kind {}", other.kind()),
    }
}

#[test]
fn test_missing_required_variable() {
    let dir = temp_test_dir();
    let path = dir.path().join("gistemp.nc");
    write_grid_file(&path, &GridFileSpec::small(2022, 1)).unwrap();

    let err = read_grid_file(&path, &["tempanomaly", "sst"]).unwrap_err();
    assert!(matches!(err, NetCdfError::MissingData(msg) if msg.contains("sst")));
}

#[test]
fn test_descending_latitude_rejected() {
    let dir = temp_test_dir();
    let path = dir.path().join("gistemp.nc");
    let mut spec = GridFileSpec::small(2022, 1);
    spec.descending_lat = true;
    write_grid_file(&path, &spec).unwrap();

    let err = read_grid_file(&path, &["tempanomaly"]).unwrap_err();
    assert!(matches!(err, NetCdfError::InvalidFormat(msg) if msg.contains("lat")));
}

#[test]
fn test_not_a_netcdf_file() {
    let dir = temp_test_dir();
    let path = dir.path().join("broken.nc");
    std::fs::write(&path, b"definitely not netcdf").unwrap();

    assert!(matches!(
        read_grid_file(&path, &[]),
        Err(NetCdfError::InvalidFormat(_))
    ));
}

#[test]
fn test_missing_file() {
    let dir = temp_test_dir();
    assert!(matches!(
        read_grid_file(&dir.path().join("absent.nc"), &[]),
        Err(NetCdfError::IoError(_))
    ));
}
