//! Zarr V3 writer for labeled array datasets.
//!
//! A dataset becomes a group at the store root holding the dataset
//! attributes, with one array per coordinate and data variable. Every array
//! is chunked with the same [`ChunkPlan`]; dimensions the plan does not cover
//! are stored in a single chunk.

use std::path::Path;
use std::sync::Arc;

use obs_dataset::{
    to_epoch_millis, ArrayValues, ChunkPlan, LabeledArrayDataset, Variable, EPOCH_MILLIS_UNITS,
};
use tracing::debug;
use zarrs::array::codec::bytes_to_bytes::blosc::{
    BloscCodec, BloscCompressionLevel, BloscShuffleMode,
};
use zarrs::array::codec::BytesToBytesCodecTraits;
use zarrs::array::{Array, ArrayBuilder, DataType, FillValue};
use zarrs::array_subset::ArraySubset;
use zarrs::group::GroupBuilder;
use zarrs_filesystem::FilesystemStore;

use crate::config::WriterConfig;
use crate::error::{StorageError, StorageResult};

/// Result of writing a Zarr store.
#[derive(Debug, Clone)]
pub struct ZarrWriteResult {
    /// Number of arrays written (coordinates and data variables).
    pub arrays: usize,
    /// Total bytes on disk under the store directory.
    pub bytes_written: u64,
}

/// Writer for creating Zarr V3 stores from datasets.
pub struct ZarrWriter {
    config: WriterConfig,
}

impl ZarrWriter {
    /// Create a new ZarrWriter with the given configuration.
    pub fn new(config: WriterConfig) -> Self {
        Self { config }
    }

    /// Write `ds` as a Zarr store rooted at `dir`, replacing any existing
    /// store there.
    pub fn write(
        &self,
        dir: &Path,
        ds: &LabeledArrayDataset,
        plan: &ChunkPlan,
    ) -> StorageResult<ZarrWriteResult> {
        // Text has no fixed-width Zarr representation here
        for var in ds.coords().iter().chain(ds.data_vars()) {
            if let ArrayValues::Text(_) = var.values {
                return Err(StorageError::UnsupportedType {
                    name: var.name.clone(),
                    kind: var.values.kind().to_string(),
                });
            }
        }

        if dir.exists() {
            std::fs::remove_dir_all(dir)?;
        }
        std::fs::create_dir_all(dir)?;
        let store = Arc::new(FilesystemStore::new(dir).map_err(StorageError::zarr)?);

        let mut group_attrs = serde_json::Map::new();
        for (key, value) in ds.attrs() {
            group_attrs.insert(key.clone(), serde_json::json!(value));
        }
        let mut group_builder = GroupBuilder::new();
        group_builder.attributes(group_attrs);
        let group = group_builder
            .build(store.clone(), "/")
            .map_err(StorageError::zarr)?;
        group.store_metadata().map_err(StorageError::zarr)?;

        let mut arrays = 0;
        for var in ds.coords().iter().chain(ds.data_vars()) {
            let shape = ds.shape_of(var)?;
            let chunk_shape = plan.chunk_shape(ds, var)?;
            self.write_variable(&store, var, &shape, &chunk_shape)?;
            arrays += 1;
        }

        let bytes_written = directory_size(dir)?;
        debug!(
            path = %dir.display(),
            arrays = arrays,
            bytes = bytes_written,
            compression = %self.config.zarr_compression,
            "Wrote Zarr store"
        );

        Ok(ZarrWriteResult {
            arrays,
            bytes_written,
        })
    }

    fn write_variable(
        &self,
        store: &Arc<FilesystemStore>,
        var: &Variable,
        shape: &[usize],
        chunk_shape: &[usize],
    ) -> StorageResult<()> {
        let (data_type, fill_value, item_size) = match &var.values {
            ArrayValues::Float64(_) => (DataType::Float64, FillValue::from(f64::NAN), 8),
            ArrayValues::Float32(_) => (DataType::Float32, FillValue::from(f32::NAN), 4),
            ArrayValues::Int64(_) | ArrayValues::Time(_) => {
                (DataType::Int64, FillValue::from(0i64), 8)
            }
            ArrayValues::Text(_) => {
                return Err(StorageError::UnsupportedType {
                    name: var.name.clone(),
                    kind: var.values.kind().to_string(),
                })
            }
        };

        let mut attrs = serde_json::Map::new();
        for (key, value) in &var.attrs {
            attrs.insert(key.clone(), serde_json::json!(value));
        }
        if let ArrayValues::Time(_) = var.values {
            attrs.insert("units".to_string(), serde_json::json!(EPOCH_MILLIS_UNITS));
        }

        let chunk_grid: zarrs::array::ChunkGrid = chunk_shape
            .iter()
            .map(|&c| c as u64)
            .collect::<Vec<_>>()
            .try_into()
            .map_err(|e| StorageError::zarr(format!("{:?}", e)))?;

        let mut binding = ArrayBuilder::new(
            shape.iter().map(|&n| n as u64).collect::<Vec<_>>(),
            data_type,
            chunk_grid,
            fill_value,
        );
        let mut builder = binding
            .dimension_names(Some(var.dims.iter().map(String::as_str)))
            .attributes(attrs);

        if let Some(codec) = self.blosc_codec(item_size)? {
            builder = builder.bytes_to_bytes_codecs(vec![codec]);
        }

        let path = format!("/{}", var.name);
        let array = builder
            .build(store.clone(), &path)
            .map_err(StorageError::zarr)?;
        array.store_metadata().map_err(StorageError::zarr)?;

        if var.values.is_empty() {
            return Ok(());
        }
        store_values(&array, shape, &var.values)
    }

    /// Blosc codec for arrays of `item_size`-byte elements, `None` when
    /// compression is off.
    fn blosc_codec(
        &self,
        item_size: usize,
    ) -> StorageResult<Option<Arc<dyn BytesToBytesCodecTraits>>> {
        let Some(compressor) = self.config.zarr_compression.blosc_compressor() else {
            return Ok(None);
        };
        let level = BloscCompressionLevel::try_from(self.config.zarr_compression_level)
            .map_err(|_| {
                StorageError::Configuration(format!(
                    "invalid Zarr compression level {}",
                    self.config.zarr_compression_level
                ))
            })?;

        // Shuffling needs the element width
        let (shuffle, typesize) = if self.config.zarr_shuffle {
            (BloscShuffleMode::Shuffle, Some(item_size))
        } else {
            (BloscShuffleMode::NoShuffle, None)
        };

        let codec: Arc<dyn BytesToBytesCodecTraits> = Arc::new(
            BloscCodec::new(compressor, level, None, shuffle, typesize)
                .map_err(|e| StorageError::Configuration(e.to_string()))?,
        );
        Ok(Some(codec))
    }
}

fn store_values(
    array: &Array<FilesystemStore>,
    shape: &[usize],
    values: &ArrayValues,
) -> StorageResult<()> {
    let subset = ArraySubset::new_with_start_shape(
        vec![0; shape.len()],
        shape.iter().map(|&n| n as u64).collect(),
    )
    .map_err(StorageError::zarr)?;

    let stored = match values {
        ArrayValues::Float64(v) => array.store_array_subset_elements(&subset, v),
        ArrayValues::Float32(v) => array.store_array_subset_elements(&subset, v),
        ArrayValues::Int64(v) => array.store_array_subset_elements(&subset, v),
        ArrayValues::Time(v) => {
            let millis: Vec<i64> = v.iter().map(to_epoch_millis).collect();
            array.store_array_subset_elements(&subset, &millis)
        }
        ArrayValues::Text(_) => return Ok(()),
    };
    stored.map_err(StorageError::zarr)
}

/// Total size of the regular files under `dir`.
pub fn directory_size(dir: &Path) -> StorageResult<u64> {
    let mut total = 0;
    for entry in walkdir::WalkDir::new(dir) {
        let entry = entry?;
        if entry.file_type().is_file() {
            total += entry.metadata()?.len();
        }
    }
    Ok(total)
}
