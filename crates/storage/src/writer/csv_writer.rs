//! Tab-separated row encoding.
//!
//! One header line of column names, then one line per row. No index column.
//! Timestamps are written as `YYYY-MM-DD HH:MM:SS[.fff]`, missing values as
//! `NaN`.

use obs_dataset::{parse_timestamp, ArrayValues, Column, ObservationTable, TIME};

use crate::error::{StorageError, StorageResult};

const DELIMITER: u8 = b'\t';
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Encode `table` as tab-separated text.
pub fn encode_csv(table: &ObservationTable) -> StorageResult<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(DELIMITER)
        .from_writer(Vec::new());

    writer.write_record(table.column_names())?;

    let mut record = Vec::with_capacity(table.num_columns());
    for row in 0..table.num_rows() {
        record.clear();
        for col in table.columns() {
            record.push(format_cell(&col.values, row));
        }
        writer.write_record(&record)?;
    }

    writer.into_inner().map_err(|e| StorageError::Io(e.into_error()))
}

fn format_cell(values: &ArrayValues, row: usize) -> String {
    match values {
        ArrayValues::Float64(v) => v[row].to_string(),
        ArrayValues::Float32(v) => v[row].to_string(),
        ArrayValues::Int64(v) => v[row].to_string(),
        ArrayValues::Time(v) => v[row].format(TIME_FORMAT).to_string(),
        ArrayValues::Text(v) => v[row].clone(),
    }
}

/// Decode tab-separated text produced by [`encode_csv`].
///
/// The `time` column is parsed into timestamps. Other columns become
/// `Float64` when every cell parses as a number, text otherwise.
pub fn decode_csv(data: &[u8]) -> StorageResult<ObservationTable> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(DELIMITER)
        .from_reader(data);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for record in reader.records() {
        let record = record?;
        for (i, field) in record.iter().enumerate() {
            if let Some(col) = cells.get_mut(i) {
                col.push(field.to_string());
            }
        }
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, raw)| {
            let values = infer_values(&name, raw)?;
            Ok(Column::new(name, values))
        })
        .collect::<StorageResult<Vec<_>>>()?;

    Ok(ObservationTable::new(columns)?)
}

fn infer_values(name: &str, raw: Vec<String>) -> StorageResult<ArrayValues> {
    if name == TIME {
        let times = raw
            .iter()
            .map(|s| parse_timestamp(s))
            .collect::<Result<Vec<_>, _>>()
            .map_err(obs_dataset::DatasetError::from)?;
        return Ok(ArrayValues::Time(times));
    }

    let numbers: Result<Vec<f64>, _> = raw.iter().map(|s| s.parse::<f64>()).collect();
    Ok(match numbers {
        Ok(v) => ArrayValues::Float64(v),
        Err(_) => ArrayValues::Text(raw),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_table() -> ObservationTable {
        let t0 = NaiveDate::from_ymd_opt(2023, 5, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let t1 = NaiveDate::from_ymd_opt(2023, 6, 1)
            .unwrap()
            .and_hms_milli_opt(12, 30, 0, 250)
            .unwrap();
        ObservationTable::new(vec![
            Column::new("time", ArrayValues::Time(vec![t0, t1])),
            Column::new("lat", ArrayValues::Float64(vec![52.5, 53.5])),
            Column::new("lon", ArrayValues::Float64(vec![13.4, 12.4])),
            Column::new("xco2", ArrayValues::Float64(vec![415.25, f64::NAN])),
        ])
        .unwrap()
    }

    #[test]
    fn test_encode_layout() {
        let text = String::from_utf8(encode_csv(&sample_table()).unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "time\tlat\tlon\txco2");
        assert_eq!(lines[1], "2023-05-01 00:00:00\t52.5\t13.4\t415.25");
        assert_eq!(lines[2], "2023-06-01 12:30:00.250\t53.5\t12.4\tNaN");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_decode_restores_columns() {
        let table = sample_table();
        let decoded = decode_csv(&encode_csv(&table).unwrap()).unwrap();

        assert_eq!(decoded.column_names(), table.column_names());
        assert_eq!(decoded.column("time"), table.column("time"));
        assert_eq!(decoded.column("lat"), table.column("lat"));
        let xco2 = decoded.column("xco2").unwrap().values.to_f64_vec().unwrap();
        assert_eq!(xco2[0], 415.25);
        assert!(xco2[1].is_nan());
    }

    #[test]
    fn test_empty_table_keeps_header() {
        let table = ObservationTable::new(vec![
            Column::new("time", ArrayValues::Time(vec![])),
            Column::new("tempanomaly", ArrayValues::Float64(vec![])),
        ])
        .unwrap();
        let bytes = encode_csv(&table).unwrap();
        assert_eq!(bytes, b"time\ttempanomaly\n");

        let decoded = decode_csv(&bytes).unwrap();
        assert_eq!(decoded.num_rows(), 0);
        assert_eq!(decoded.column_names(), vec!["time", "tempanomaly"]);
    }

    #[test]
    fn test_text_column_kept_as_text() {
        let decoded = decode_csv(b"station\tvalue\nBER\t1.5\nMUC\t2\n").unwrap();
        assert_eq!(
            decoded.column("station").unwrap().values,
            ArrayValues::Text(vec!["BER".into(), "MUC".into()])
        );
        assert_eq!(
            decoded.column("value").unwrap().values,
            ArrayValues::Float64(vec![1.5, 2.0])
        );
    }
}
