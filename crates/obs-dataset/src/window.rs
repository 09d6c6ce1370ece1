//! Spatio-temporal selection window.

use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{DatasetError, DatasetResult};

/// Year floor plus an inclusive latitude/longitude box, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingWindow {
    /// Inclusive lower bound on the observation year.
    pub year_from: i32,
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl BoundingWindow {
    /// Create a window, rejecting inverted or non-finite bounds.
    pub fn new(
        year_from: i32,
        lat_min: f64,
        lat_max: f64,
        lon_min: f64,
        lon_max: f64,
    ) -> DatasetResult<Self> {
        let bounds = [lat_min, lat_max, lon_min, lon_max];
        if bounds.iter().any(|b| !b.is_finite()) {
            return Err(DatasetError::InvalidWindow(format!(
                "bounds must be finite: {:?}",
                bounds
            )));
        }
        if lat_min > lat_max {
            return Err(DatasetError::InvalidWindow(format!(
                "lat_min {} > lat_max {}",
                lat_min, lat_max
            )));
        }
        if lon_min > lon_max {
            return Err(DatasetError::InvalidWindow(format!(
                "lon_min {} > lon_max {}",
                lon_min, lon_max
            )));
        }

        Ok(Self {
            year_from,
            lat_min,
            lat_max,
            lon_min,
            lon_max,
        })
    }

    /// Square window of `range` degrees around a point.
    pub fn around(lon: f64, lat: f64, range: f64, year_from: i32) -> DatasetResult<Self> {
        Self::new(
            year_from,
            lat - range,
            lat + range,
            lon - range,
            lon + range,
        )
    }

    pub fn contains_lat(&self, lat: f64) -> bool {
        lat >= self.lat_min && lat <= self.lat_max
    }

    pub fn contains_lon(&self, lon: f64) -> bool {
        lon >= self.lon_min && lon <= self.lon_max
    }

    pub fn contains_time(&self, time: &NaiveDateTime) -> bool {
        time.year() >= self.year_from
    }

    /// Full sample predicate used by masked selection.
    pub fn contains(&self, time: &NaiveDateTime, lat: f64, lon: f64) -> bool {
        self.contains_time(time) && self.contains_lat(lat) && self.contains_lon(lon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::parse_timestamp;

    #[test]
    fn test_around_point() {
        let window = BoundingWindow::around(13.4, 52.5, 10.0, 2023).unwrap();
        assert!((window.lat_min - 42.5).abs() < 1e-9);
        assert!((window.lat_max - 62.5).abs() < 1e-9);
        assert!((window.lon_min - 3.4).abs() < 1e-9);
        assert!((window.lon_max - 23.4).abs() < 1e-9);
        assert_eq!(window.year_from, 2023);
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        assert!(BoundingWindow::new(2020, 10.0, 5.0, 0.0, 1.0).is_err());
        assert!(BoundingWindow::new(2020, 0.0, 1.0, 10.0, 5.0).is_err());
        assert!(BoundingWindow::new(2020, f64::NAN, 1.0, 0.0, 1.0).is_err());
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let window = BoundingWindow::new(2020, -5.0, 5.0, 10.0, 20.0).unwrap();
        let t = parse_timestamp("2020-01-01T00:00:00Z").unwrap();
        assert!(window.contains(&t, -5.0, 10.0));
        assert!(window.contains(&t, 5.0, 20.0));
        assert!(!window.contains(&t, 5.0001, 20.0));

        let before = parse_timestamp("2019-12-31T23:59:59Z").unwrap();
        assert!(!window.contains(&before, 0.0, 15.0));
    }
}
