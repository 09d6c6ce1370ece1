//! Geolocation collaborator: supplies the point the window is built around.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LocationError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{name} is not a valid coordinate: {value}")]
    Invalid { name: &'static str, value: String },

    #[error("coordinate out of range: lon={lon}, lat={lat}")]
    OutOfRange { lon: f64, lat: f64 },
}

/// Source of a `(longitude, latitude)` pair in degrees.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn locate(&self) -> Result<(f64, f64), LocationError>;
}

/// A point given up front, e.g. on the command line.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation {
    pub lon: f64,
    pub lat: f64,
}

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn locate(&self) -> Result<(f64, f64), LocationError> {
        check_range(self.lon, self.lat)
    }
}

/// Reads `INGESTER_LON` and `INGESTER_LAT`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvLocationProvider;

pub const LON_VAR: &str = "INGESTER_LON";
pub const LAT_VAR: &str = "INGESTER_LAT";

#[async_trait]
impl LocationProvider for EnvLocationProvider {
    async fn locate(&self) -> Result<(f64, f64), LocationError> {
        let lon = read_coordinate(LON_VAR)?;
        let lat = read_coordinate(LAT_VAR)?;
        check_range(lon, lat)
    }
}

fn read_coordinate(name: &'static str) -> Result<f64, LocationError> {
    let value = std::env::var(name).map_err(|_| LocationError::Missing(name))?;
    value
        .trim()
        .parse()
        .map_err(|_| LocationError::Invalid { name, value })
}

fn check_range(lon: f64, lat: f64) -> Result<(f64, f64), LocationError> {
    if !(-180.0..=360.0).contains(&lon) || !(-90.0..=90.0).contains(&lat) {
        return Err(LocationError::OutOfRange { lon, lat });
    }
    Ok((lon, lat))
}
