//! Timestamp parsing and CF time decoding.
//!
//! All timestamps leave this module as timezone-naive values on the UTC
//! clock. Timezone-aware inputs are converted to UTC before the offset is
//! dropped.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;

/// Units used when a timestamp is stored as an integer offset.
pub const EPOCH_MILLIS_UNITS: &str = "milliseconds since 1970-01-01 00:00:00";

#[derive(Debug, Error)]
pub enum TimeParseError {
    #[error("Invalid time format: {0}")]
    InvalidFormat(String),

    #[error("Invalid CF time units: {0}")]
    InvalidUnits(String),

    #[error("Time offset out of range: {0}")]
    OutOfRange(String),
}

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse an encoded timestamp into a naive UTC datetime.
///
/// Accepts RFC 3339 (any offset), naive ISO 8601 with `T` or space
/// separators, and bare dates. Trailing NUL padding from fixed-width
/// strings is ignored.
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime, TimeParseError> {
    let s = s.trim_end_matches('\0').trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc).naive_utc());
    }

    let naive = s.strip_suffix('Z').unwrap_or(s);
    for format in NAIVE_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(naive, format) {
            return Ok(ndt);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(naive, "%Y-%m-%d") {
        return Ok(date.and_hms_opt(0, 0, 0).unwrap_or_default());
    }

    Err(TimeParseError::InvalidFormat(s.to_string()))
}

/// Returns true when `units` looks like a CF time unit string.
pub fn is_cf_time_units(units: &str) -> bool {
    units.contains(" since ")
}

/// Decode CF-convention numeric offsets (`"days since 1800-01-01"`) into
/// timestamps.
pub fn decode_cf_time(values: &[f64], units: &str) -> Result<Vec<NaiveDateTime>, TimeParseError> {
    let (unit, epoch) = units
        .split_once(" since ")
        .ok_or_else(|| TimeParseError::InvalidUnits(units.to_string()))?;

    let millis_per_unit: f64 = match unit.trim().to_lowercase().as_str() {
        "days" | "day" | "d" => 86_400_000.0,
        "hours" | "hour" | "hrs" | "hr" | "h" => 3_600_000.0,
        "minutes" | "minute" | "mins" | "min" => 60_000.0,
        "seconds" | "second" | "secs" | "sec" | "s" => 1_000.0,
        "milliseconds" | "millisecond" | "msec" | "ms" => 1.0,
        _ => return Err(TimeParseError::InvalidUnits(units.to_string())),
    };

    let epoch = parse_timestamp(epoch.trim().trim_end_matches(" UTC"))
        .map_err(|_| TimeParseError::InvalidUnits(units.to_string()))?;

    values
        .iter()
        .map(|&v| {
            if !v.is_finite() {
                return Err(TimeParseError::OutOfRange(v.to_string()));
            }
            let millis = (v * millis_per_unit).round();
            // Fill values such as 9.96921e36 land far outside the i64 range
            if millis < i64::MIN as f64 || millis >= i64::MAX as f64 {
                return Err(TimeParseError::OutOfRange(v.to_string()));
            }
            Duration::try_milliseconds(millis as i64)
                .and_then(|offset| epoch.checked_add_signed(offset))
                .ok_or_else(|| TimeParseError::OutOfRange(v.to_string()))
        })
        .collect()
}

/// Milliseconds since the Unix epoch for a naive UTC timestamp, the
/// integer encoding described by [`EPOCH_MILLIS_UNITS`].
pub fn to_epoch_millis(dt: &NaiveDateTime) -> i64 {
    dt.and_utc().timestamp_millis()
}
