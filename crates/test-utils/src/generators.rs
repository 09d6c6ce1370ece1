//! Writers for synthetic raw input files.
//!
//! Grid fixtures mimic GISTEMP NetCDF files: a CF time axis, regular
//! lat/lon axes, a `time_bnds` helper variable and a packed `tempanomaly`
//! short variable. Retrieval fixtures mimic OCO-2 L2 HDF5 files with the
//! three retrieval groups.

use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use hdf5::types::{FixedAscii, VarLenUnicode};

use crate::fixtures::grid::{AxisSpec, SMALL_LAT, SMALL_LON};
use crate::fixtures::time::GRID_TIME_UNITS;

/// Packed fill value for `tempanomaly`.
pub const GRID_FILL_VALUE: i16 = 32767;

/// Packing scale for `tempanomaly`.
pub const GRID_SCALE_FACTOR: f32 = 0.01;

/// OCO-2 group names.
pub const RETRIEVAL_GROUPS: [&str; 3] = ["RetrievalResults", "RetrievalGeometry", "RetrievalHeader"];

/// Layout of a grid fixture file.
#[derive(Debug, Clone)]
pub struct GridFileSpec {
    /// Year of the first monthly time step.
    pub start_year: i32,
    pub months: usize,
    pub lat: AxisSpec,
    pub lon: AxisSpec,
    /// Flat `(time, lat, lon)` indices written as the fill value.
    pub fill_cells: Vec<usize>,
    /// Write the latitude axis north to south.
    pub descending_lat: bool,
}

impl GridFileSpec {
    /// Small monthly grid over [`SMALL_LAT`] × [`SMALL_LON`].
    pub fn small(start_year: i32, months: usize) -> Self {
        Self {
            start_year,
            months,
            lat: SMALL_LAT,
            lon: SMALL_LON,
            fill_cells: Vec::new(),
            descending_lat: false,
        }
    }

    pub fn lats(&self) -> Vec<f64> {
        let mut lats = self.lat.values();
        if self.descending_lat {
            lats.reverse();
        }
        lats
    }

    pub fn lons(&self) -> Vec<f64> {
        self.lon.values()
    }

    pub fn cell_count(&self) -> usize {
        self.months * self.lat.count * self.lon.count
    }
}

/// Packed anomaly for cell `(t, y, x)`: `t*100 + y*10 + x`.
pub fn anomaly_raw(t: usize, y: usize, x: usize) -> i16 {
    (t * 100 + y * 10 + x) as i16
}

/// Unpacked anomaly the reader should produce for cell `(t, y, x)`.
///
/// The scale factor is a `float`, so the decoded value is single precision.
pub fn anomaly_value(t: usize, y: usize, x: usize) -> f64 {
    (anomaly_raw(t, y, x) as f64 * GRID_SCALE_FACTOR as f64) as f32 as f64
}

/// Days since 1800-01-01 for the 15th of each month.
pub fn month_offsets(start_year: i32, months: usize) -> Vec<f64> {
    let epoch = NaiveDate::from_ymd_opt(1800, 1, 1).expect("valid epoch");
    (0..months)
        .map(|m| {
            let year = start_year + (m / 12) as i32;
            let month = (m % 12) as u32 + 1;
            let date = NaiveDate::from_ymd_opt(year, month, 15).expect("valid fixture date");
            (date - epoch).num_days() as f64
        })
        .collect()
}

/// Write a GISTEMP-shaped NetCDF file.
pub fn write_grid_file(path: &Path, spec: &GridFileSpec) -> Result<(), netcdf::Error> {
    let lats = spec.lats();
    let lons = spec.lons();
    let times = month_offsets(spec.start_year, spec.months);

    let mut raw = Vec::with_capacity(spec.cell_count());
    for t in 0..spec.months {
        for y in 0..lats.len() {
            for x in 0..lons.len() {
                raw.push(anomaly_raw(t, y, x));
            }
        }
    }
    for &cell in &spec.fill_cells {
        raw[cell] = GRID_FILL_VALUE;
    }

    let bounds: Vec<f64> = times.iter().flat_map(|&t| [t - 14.0, t + 14.0]).collect();

    let mut file = netcdf::create(path)?;
    file.add_attribute("title", "GISTEMP fixture")?;
    file.add_dimension("time", spec.months)?;
    file.add_dimension("lat", lats.len())?;
    file.add_dimension("lon", lons.len())?;
    file.add_dimension("nv", 2)?;

    {
        let mut var = file.add_variable::<f64>("time", &["time"])?;
        var.put_attribute("units", GRID_TIME_UNITS)?;
        var.put_attribute("bounds", "time_bnds")?;
        var.put_values(&times, ..)?;
    }
    {
        let mut var = file.add_variable::<f64>("lat", &["lat"])?;
        var.put_attribute("units", "degrees_north")?;
        var.put_values(&lats, ..)?;
    }
    {
        let mut var = file.add_variable::<f64>("lon", &["lon"])?;
        var.put_attribute("units", "degrees_east")?;
        var.put_values(&lons, ..)?;
    }
    {
        let mut var = file.add_variable::<f64>("time_bnds", &["time", "nv"])?;
        var.put_values(&bounds, ..)?;
    }
    {
        let mut var = file.add_variable::<i16>("tempanomaly", &["time", "lat", "lon"])?;
        var.put_attribute("long_name", "Surface temperature anomaly")?;
        var.put_attribute("units", "K")?;
        var.put_attribute("scale_factor", GRID_SCALE_FACTOR)?;
        var.put_attribute("_FillValue", GRID_FILL_VALUE)?;
        var.put_values(&raw, ..)?;
    }

    Ok(())
}

/// One OCO-2 sounding.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalSample {
    pub time: String,
    pub lat: f64,
    pub lon: f64,
    /// Column-averaged CO2 as a dry-air mole fraction.
    pub xco2: f64,
}

impl RetrievalSample {
    pub fn new(time: &str, lat: f64, lon: f64, xco2: f64) -> Self {
        Self {
            time: time.to_string(),
            lat,
            lon,
            xco2,
        }
    }
}

/// On-disk element types used by a retrieval fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetrievalEncoding {
    /// Variable-length UTF-8 times and `f64` values.
    #[default]
    VarLen,
    /// 24-byte ASCII times and `f32` `xco2`, as in L2 Lite products.
    FixedAscii,
}

/// Width of `retrieval_time_string` in [`RetrievalEncoding::FixedAscii`].
pub const FIXED_TIME_LEN: usize = 24;

/// Write an OCO-2-shaped HDF5 file with all three retrieval groups.
pub fn write_retrieval_file(path: &Path, samples: &[RetrievalSample]) -> hdf5::Result<()> {
    write_retrieval(path, samples, &RETRIEVAL_GROUPS, RetrievalEncoding::VarLen)
}

/// Write an OCO-2-shaped HDF5 file with the given element types.
pub fn write_retrieval_file_encoded(
    path: &Path,
    samples: &[RetrievalSample],
    encoding: RetrievalEncoding,
) -> hdf5::Result<()> {
    write_retrieval(path, samples, &RETRIEVAL_GROUPS, encoding)
}

/// Write an OCO-2-shaped HDF5 file containing only the listed groups.
pub fn write_retrieval_file_with_groups(
    path: &Path,
    samples: &[RetrievalSample],
    groups: &[&str],
) -> hdf5::Result<()> {
    write_retrieval(path, samples, groups, RetrievalEncoding::VarLen)
}

fn write_retrieval(
    path: &Path,
    samples: &[RetrievalSample],
    groups: &[&str],
    encoding: RetrievalEncoding,
) -> hdf5::Result<()> {
    let file = hdf5::File::create(path)?;

    for &group_name in groups {
        let group = file.create_group(group_name)?;
        match group_name {
            "RetrievalResults" => {
                let builder = group.new_dataset_builder();
                match encoding {
                    RetrievalEncoding::VarLen => {
                        let xco2: Vec<f64> = samples.iter().map(|s| s.xco2).collect();
                        builder.with_data(xco2.as_slice()).create("xco2")?;
                    }
                    RetrievalEncoding::FixedAscii => {
                        let xco2: Vec<f32> = samples.iter().map(|s| s.xco2 as f32).collect();
                        builder.with_data(xco2.as_slice()).create("xco2")?;
                    }
                }
            }
            "RetrievalGeometry" => {
                let lat: Vec<f64> = samples.iter().map(|s| s.lat).collect();
                let lon: Vec<f64> = samples.iter().map(|s| s.lon).collect();
                group
                    .new_dataset_builder()
                    .with_data(lat.as_slice())
                    .create("retrieval_latitude")?;
                group
                    .new_dataset_builder()
                    .with_data(lon.as_slice())
                    .create("retrieval_longitude")?;
            }
            "RetrievalHeader" => {
                let builder = group.new_dataset_builder();
                match encoding {
                    RetrievalEncoding::VarLen => {
                        let times: Vec<VarLenUnicode> = samples
                            .iter()
                            .map(|s| {
                                VarLenUnicode::from_str(&s.time)
                                    .expect("fixture time is valid UTF-8")
                            })
                            .collect();
                        builder
                            .with_data(times.as_slice())
                            .create("retrieval_time_string")?;
                    }
                    RetrievalEncoding::FixedAscii => {
                        let times: Vec<FixedAscii<FIXED_TIME_LEN>> = samples
                            .iter()
                            .map(|s| {
                                FixedAscii::from_ascii(s.time.as_bytes())
                                    .expect("fixture time fits the fixed width")
                            })
                            .collect();
                        builder
                            .with_data(times.as_slice())
                            .create("retrieval_time_string")?;
                    }
                }
            }
            _ => {}
        }
    }

    Ok(())
}

/// Three soundings around `(lon, lat)`, one per fixture year.
pub fn samples_around(lon: f64, lat: f64) -> Vec<RetrievalSample> {
    use crate::fixtures::time::{RETRIEVAL_2022, RETRIEVAL_2023, RETRIEVAL_2024};

    vec![
        RetrievalSample::new(RETRIEVAL_2022, lat, lon, 0.000410),
        RetrievalSample::new(RETRIEVAL_2023, lat + 1.0, lon - 1.0, 0.000415),
        RetrievalSample::new(RETRIEVAL_2024, lat - 1.0, lon + 1.0, 0.000420),
    ]
}
