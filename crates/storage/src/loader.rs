//! Loaders for processed tabular artifacts.

use std::path::Path;

use bytes::Bytes;
use obs_dataset::ObservationTable;
use tracing::debug;

use crate::destination::Encoding;
use crate::error::{StorageError, StorageResult};
use crate::object_store::{processed_key, ObjectStorage};
use crate::writer::{artifact_path, decode_csv, decode_parquet};

/// Read `<processed_dir>/<name>.csv` back into a table.
pub fn load_csv(processed_dir: &Path, name: &str) -> StorageResult<ObservationTable> {
    let path = artifact_path(processed_dir, name, Encoding::Csv);
    let data = std::fs::read(&path)?;
    debug!(path = %path.display(), size = data.len(), "Loading CSV artifact");
    decode_csv(&data)
}

/// Read `<processed_dir>/<name>.parquet` back into a table.
pub fn load_parquet(processed_dir: &Path, name: &str) -> StorageResult<ObservationTable> {
    let path = artifact_path(processed_dir, name, Encoding::Parquet);
    let data = std::fs::read(&path)?;
    debug!(path = %path.display(), size = data.len(), "Loading Parquet artifact");
    decode_parquet(Bytes::from(data))
}

/// Fetch `processed/<name>.<ext>` from object storage and decode it.
pub async fn fetch_table(
    storage: &ObjectStorage,
    name: &str,
    encoding: Encoding,
) -> StorageResult<ObservationTable> {
    let key = processed_key(name, encoding.extension());
    let data = storage.get(&key).await?;
    match encoding {
        Encoding::Csv => decode_csv(&data),
        Encoding::Parquet => decode_parquet(data),
        Encoding::Zarr => Err(StorageError::UnsupportedArtifact {
            encoding: encoding.extension(),
            artifact: "table",
        }),
    }
}
