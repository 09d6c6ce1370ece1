//! Selection, projection and combination properties across whole datasets.

use obs_dataset::{
    combine, plan_chunks, select, select_masked, select_range, to_table, ArrayValues,
    BoundingWindow, Dimension, LabeledArrayDataset, ObservationTable, Variable, BYTES_PER_MB,
};

fn timestamps(years: &[i32]) -> Vec<String> {
    years
        .iter()
        .map(|y| format!("{}-07-01T00:00:00Z", y))
        .collect()
}

/// 3 years × 5 lats × 4 lons, value = t*100 + y*10 + x.
fn gridded() -> LabeledArrayDataset {
    let years = [2020, 2021, 2022];
    let lats = vec![-20.0, -10.0, 0.0, 10.0, 20.0];
    let lons = vec![100.0, 110.0, 120.0, 130.0];
    let mut values = Vec::new();
    for t in 0..years.len() {
        for y in 0..lats.len() {
            for x in 0..lons.len() {
                values.push((t * 100 + y * 10 + x) as f64);
            }
        }
    }

    LabeledArrayDataset::new(
        vec![
            Dimension::new("time", years.len()),
            Dimension::new("lat", lats.len()),
            Dimension::new("lon", lons.len()),
        ],
        vec![
            Variable::new("time", vec!["time"], ArrayValues::Text(timestamps(&years))),
            Variable::new("lat", vec!["lat"], ArrayValues::Float64(lats)),
            Variable::new("lon", vec!["lon"], ArrayValues::Float64(lons)),
        ],
        vec![Variable::new(
            "tempanomaly",
            vec!["time", "lat", "lon"],
            ArrayValues::Float64(values),
        )],
    )
    .unwrap()
}

/// The same observations as [`gridded`], one sample per grid cell.
fn scattered() -> LabeledArrayDataset {
    let table = to_table(&gridded()).unwrap();
    let n = table.num_rows();
    let col = |name: &str| table.column(name).unwrap().values.clone();

    LabeledArrayDataset::new(
        vec![Dimension::new("retrieval", n)],
        vec![
            Variable::new("time", vec!["retrieval"], col("time")),
            Variable::new("lat", vec!["retrieval"], col("lat")),
            Variable::new("lon", vec!["retrieval"], col("lon")),
        ],
        vec![Variable::new("tempanomaly", vec!["retrieval"], col("tempanomaly"))],
    )
    .unwrap()
}

fn rows(table: &ObservationTable) -> Vec<(String, f64, f64, f64)> {
    let times = table.column("time").unwrap().values.to_datetimes().unwrap();
    let lat = table.column("lat").unwrap().values.to_f64_vec().unwrap();
    let lon = table.column("lon").unwrap().values.to_f64_vec().unwrap();
    let v = table.column("tempanomaly").unwrap().values.to_f64_vec().unwrap();
    (0..table.num_rows())
        .map(|i| (times[i].to_string(), lat[i], lon[i], v[i]))
        .collect()
}

// ============================================================================
// Window bounds
// ============================================================================

#[test]
fn test_every_selected_row_is_inside_window() {
    let window = BoundingWindow::new(2021, -10.0, 10.0, 105.0, 130.0).unwrap();
    let table = to_table(&select(&gridded(), &window).unwrap()).unwrap();

    assert_eq!(table.num_rows(), 2 * 3 * 3);
    for (time, lat, lon, _) in rows(&table) {
        assert!(time.as_str() >= "2021");
        assert!((-10.0..=10.0).contains(&lat));
        assert!((105.0..=130.0).contains(&lon));
    }
}

#[test]
fn test_masked_and_range_selection_agree() {
    let window = BoundingWindow::new(2022, -15.0, 15.0, 100.0, 115.0).unwrap();

    let range = to_table(&select_range(&gridded(), &window).unwrap()).unwrap();
    let masked = to_table(&select_masked(&scattered(), &window, "retrieval").unwrap()).unwrap();

    assert!(!range.is_empty());
    assert_eq!(rows(&range), rows(&masked));
}

#[test]
fn test_empty_window_yields_zero_rows() {
    let window = BoundingWindow::new(2020, 60.0, 70.0, 100.0, 130.0).unwrap();

    let grid = to_table(&select(&gridded(), &window).unwrap()).unwrap();
    assert_eq!(grid.num_rows(), 0);
    assert_eq!(grid.column_names(), vec!["time", "lat", "lon", "tempanomaly"]);

    let samples = to_table(&select(&scattered(), &window).unwrap()).unwrap();
    assert_eq!(samples.num_rows(), 0);
}

#[test]
fn test_future_year_floor_yields_zero_rows() {
    let window = BoundingWindow::new(2100, -90.0, 90.0, -180.0, 360.0).unwrap();
    let out = select(&scattered(), &window).unwrap();
    assert_eq!(out.dim_size("retrieval"), Some(0));
}

// ============================================================================
// Combine
// ============================================================================

#[test]
fn test_combine_identity() {
    let ds = gridded();
    assert_eq!(combine(std::slice::from_ref(&ds), "time").unwrap(), ds);
}

#[test]
fn test_combine_then_select_matches_whole() {
    let whole = gridded();
    let first = whole
        .isel(&[("time".to_string(), vec![0, 1])].into_iter().collect())
        .unwrap();
    let second = whole
        .isel(&[("time".to_string(), vec![2])].into_iter().collect())
        .unwrap();

    let combined = combine(&[first, second], "time").unwrap();
    let window = BoundingWindow::new(2020, -90.0, 90.0, -180.0, 180.0).unwrap();

    assert_eq!(
        rows(&to_table(&select(&combined, &window).unwrap()).unwrap()),
        rows(&to_table(&whole).unwrap())
    );
}

// ============================================================================
// Chunk planning
// ============================================================================

#[test]
fn test_chunk_plan_within_budget() {
    let plan = plan_chunks(&gridded(), 64).unwrap();
    assert!(plan.estimated_bytes() <= 64);
    assert!(plan.iter().all(|(_, len)| len >= 1));

    let full = plan_chunks(&gridded(), BYTES_PER_MB).unwrap();
    assert_eq!(
        full.iter().collect::<Vec<_>>(),
        vec![("time", 3), ("lat", 5), ("lon", 4)]
    );
}
