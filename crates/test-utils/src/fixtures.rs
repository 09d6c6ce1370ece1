//! Pre-defined observation fixtures.

/// Points and windows used across the suite, as `(lon, lat)`.
pub mod location {
    /// Berlin
    pub const BERLIN: (f64, f64) = (13.4, 52.5);

    /// Open ocean near the equator and antimeridian
    pub const PACIFIC: (f64, f64) = (-170.0, 0.0);

    /// Default search radius in degrees
    pub const DEFAULT_RANGE: f64 = 10.0;
}

/// Regular lat/lon axes for grid fixtures.
pub mod grid {
    /// Axis description: `count` values starting at `start`, `step` apart.
    #[derive(Debug, Clone, Copy)]
    pub struct AxisSpec {
        pub start: f64,
        pub step: f64,
        pub count: usize,
    }

    impl AxisSpec {
        pub fn values(&self) -> Vec<f64> {
            (0..self.count)
                .map(|i| self.start + self.step * i as f64)
                .collect()
        }
    }

    /// 5 latitudes from -20 to 20, 10 degrees apart.
    pub const SMALL_LAT: AxisSpec = AxisSpec {
        start: -20.0,
        step: 10.0,
        count: 5,
    };

    /// 4 longitudes from 100 to 130, 10 degrees apart.
    pub const SMALL_LON: AxisSpec = AxisSpec {
        start: 100.0,
        step: 10.0,
        count: 4,
    };

    /// GISTEMP's 2 degree global latitude axis.
    pub const GISTEMP_LAT: AxisSpec = AxisSpec {
        start: -89.0,
        step: 2.0,
        count: 90,
    };

    /// GISTEMP's 2 degree global longitude axis.
    pub const GISTEMP_LON: AxisSpec = AxisSpec {
        start: -179.0,
        step: 2.0,
        count: 180,
    };
}

/// Retrieval timestamps in the encoding OCO-2 L2 files use.
pub mod time {
    pub const RETRIEVAL_2022: &str = "2022-03-14T10:15:30.250Z";
    pub const RETRIEVAL_2023: &str = "2023-08-01T04:00:00.000Z";
    pub const RETRIEVAL_2024: &str = "2024-01-15T12:00:00.000Z";

    /// CF units used for grid fixture time axes.
    pub const GRID_TIME_UNITS: &str = "days since 1800-01-01 00:00:00";
}
