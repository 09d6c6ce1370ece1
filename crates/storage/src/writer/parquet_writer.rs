//! Columnar Parquet encoding through Arrow record batches.

use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, Float32Array, Float64Array, Int64Array, StringArray,
    TimestampMicrosecondArray,
};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use chrono::{DateTime, NaiveDateTime};
use obs_dataset::{ArrayValues, Column, ObservationTable};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use crate::error::{StorageError, StorageResult};

const MICROS_PER_SECOND: i64 = 1_000_000;

/// Encode `table` as a single-row-group Parquet file.
pub fn encode_parquet(table: &ObservationTable) -> StorageResult<Vec<u8>> {
    let fields: Vec<Field> = table
        .columns()
        .iter()
        .map(|c| Field::new(c.name.as_str(), arrow_type(&c.values), true))
        .collect();
    let schema = Arc::new(Schema::new(fields));

    let arrays: Vec<ArrayRef> = table.columns().iter().map(|c| to_arrow(&c.values)).collect();
    let batch = RecordBatch::try_new(schema.clone(), arrays)?;

    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut buffer = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buffer, schema, Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    Ok(buffer)
}

fn arrow_type(values: &ArrayValues) -> DataType {
    match values {
        ArrayValues::Float64(_) => DataType::Float64,
        ArrayValues::Float32(_) => DataType::Float32,
        ArrayValues::Int64(_) => DataType::Int64,
        ArrayValues::Time(_) => DataType::Timestamp(TimeUnit::Microsecond, None),
        ArrayValues::Text(_) => DataType::Utf8,
    }
}

fn to_arrow(values: &ArrayValues) -> ArrayRef {
    match values {
        ArrayValues::Float64(v) => Arc::new(Float64Array::from(v.clone())),
        ArrayValues::Float32(v) => Arc::new(Float32Array::from(v.clone())),
        ArrayValues::Int64(v) => Arc::new(Int64Array::from(v.clone())),
        ArrayValues::Time(v) => Arc::new(TimestampMicrosecondArray::from(
            v.iter()
                .map(|t| t.and_utc().timestamp_micros())
                .collect::<Vec<_>>(),
        )),
        ArrayValues::Text(v) => Arc::new(StringArray::from(v.clone())),
    }
}

/// Decode a Parquet file written by [`encode_parquet`].
pub fn decode_parquet(data: Bytes) -> StorageResult<ObservationTable> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(data)?;
    let schema = builder.schema().clone();
    let reader = builder.build()?;

    let mut columns: Vec<Column> = Vec::with_capacity(schema.fields().len());
    for field in schema.fields() {
        let values = empty_values(field.name(), field.data_type())?;
        columns.push(Column::new(field.name().clone(), values));
    }

    for batch in reader {
        let batch = batch?;
        for (i, col) in columns.iter_mut().enumerate() {
            let chunk = from_arrow(&col.name, batch.column(i).as_ref())?;
            col.values.extend_from(&chunk)?;
        }
    }

    Ok(ObservationTable::new(columns)?)
}

fn empty_values(name: &str, data_type: &DataType) -> StorageResult<ArrayValues> {
    Ok(match data_type {
        DataType::Float64 => ArrayValues::Float64(Vec::new()),
        DataType::Float32 => ArrayValues::Float32(Vec::new()),
        DataType::Int64 => ArrayValues::Int64(Vec::new()),
        DataType::Timestamp(TimeUnit::Microsecond, _) => ArrayValues::Time(Vec::new()),
        DataType::Utf8 => ArrayValues::Text(Vec::new()),
        other => return Err(unsupported(name, other)),
    })
}

fn from_arrow(name: &str, array: &dyn Array) -> StorageResult<ArrayValues> {
    let any = array.as_any();
    if let Some(a) = any.downcast_ref::<Float64Array>() {
        return Ok(ArrayValues::Float64(
            a.iter().map(|v| v.unwrap_or(f64::NAN)).collect(),
        ));
    }
    if let Some(a) = any.downcast_ref::<Float32Array>() {
        return Ok(ArrayValues::Float32(
            a.iter().map(|v| v.unwrap_or(f32::NAN)).collect(),
        ));
    }
    if let Some(a) = any.downcast_ref::<Int64Array>() {
        return Ok(ArrayValues::Int64(a.values().to_vec()));
    }
    if let Some(a) = any.downcast_ref::<TimestampMicrosecondArray>() {
        let times = a
            .values()
            .iter()
            .map(|&us| micros_to_datetime(us).ok_or_else(|| out_of_range(name, us)))
            .collect::<StorageResult<Vec<_>>>()?;
        return Ok(ArrayValues::Time(times));
    }
    if let Some(a) = any.downcast_ref::<StringArray>() {
        return Ok(ArrayValues::Text(
            a.iter().map(|v| v.unwrap_or_default().to_string()).collect(),
        ));
    }
    Err(unsupported(name, array.data_type()))
}

fn micros_to_datetime(us: i64) -> Option<NaiveDateTime> {
    let secs = us.div_euclid(MICROS_PER_SECOND);
    let nanos = (us.rem_euclid(MICROS_PER_SECOND) * 1_000) as u32;
    DateTime::from_timestamp(secs, nanos).map(|dt| dt.naive_utc())
}

fn unsupported(name: &str, data_type: &DataType) -> StorageError {
    StorageError::UnsupportedType {
        name: name.to_string(),
        kind: data_type.to_string(),
    }
}

fn out_of_range(name: &str, us: i64) -> StorageError {
    StorageError::UnsupportedType {
        name: name.to_string(),
        kind: format!("timestamp {}us out of range", us),
    }
}
