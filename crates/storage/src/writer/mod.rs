//! Persistence Writer: encodes processed artifacts and stores them locally
//! or in object storage.

mod csv_writer;
mod parquet_writer;
mod zarr_writer;

pub use csv_writer::{decode_csv, encode_csv};
pub use parquet_writer::{decode_parquet, encode_parquet};
pub use zarr_writer::{directory_size, ZarrWriteResult, ZarrWriter};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use obs_dataset::{
    plan_chunks, table_to_dataset, ChunkPlan, LabeledArrayDataset, ObservationTable,
};
use object_store::ObjectStore;
use tracing::info;

use crate::config::WriterConfig;
use crate::destination::{Artifact, Destination, Encoding};
use crate::error::{StorageError, StorageResult};
use crate::object_store::{processed_key, ObjectStorage, ObjectStorageConfig};
use crate::upload::upload_directory;

/// Canonical artifact name for CO2 retrievals.
pub const CO2_ARTIFACT: &str = "co2";

/// Canonical artifact name for temperature anomalies.
pub const TEMPANOMALIES_ARTIFACT: &str = "tempanomalies";

/// Outcome of one write.
#[derive(Debug, Clone)]
pub struct WriteResult {
    /// Local path or `s3://<bucket>/<key>` URL of the artifact.
    pub location: String,
    pub bytes_written: u64,
    /// Chunk plan applied, for chunked-array writes.
    pub chunk_plan: Option<ChunkPlan>,
}

/// Writes tables and datasets under canonical names in any [`Encoding`].
pub struct PersistenceWriter {
    config: WriterConfig,
    object_config: ObjectStorageConfig,
    store_override: Option<Arc<dyn ObjectStore>>,
}

impl PersistenceWriter {
    /// Create a writer, validating `config`.
    pub fn new(config: WriterConfig, object_config: ObjectStorageConfig) -> StorageResult<Self> {
        config.validate().map_err(StorageError::Configuration)?;
        Ok(Self {
            config,
            object_config,
            store_override: None,
        })
    }

    /// Send object-storage writes to `store` instead of building an S3
    /// client from the configuration.
    pub fn with_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.store_override = Some(store);
        self
    }

    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    /// Persist `artifact` as `<name>.<ext>` at `destination`.
    ///
    /// CSV and Parquet accept tables only. Zarr accepts datasets and
    /// converts tables first; the chunk plan is computed from the configured
    /// byte budget and applied to every variable. Object-storage
    /// destinations fail with [`StorageError::Configuration`] before
    /// anything is written when no bucket is available.
    pub async fn write(
        &self,
        name: &str,
        artifact: Artifact<'_>,
        destination: &Destination,
        encoding: Encoding,
    ) -> StorageResult<WriteResult> {
        let remote = self.remote_storage(destination)?;

        let result = match encoding {
            Encoding::Csv | Encoding::Parquet => {
                let table = match artifact {
                    Artifact::Table(table) => table,
                    Artifact::Dataset(_) => {
                        return Err(StorageError::UnsupportedArtifact {
                            encoding: encoding.extension(),
                            artifact: artifact.kind(),
                        })
                    }
                };
                let data = match encoding {
                    Encoding::Csv => encode_csv(table)?,
                    _ => encode_parquet(table)?,
                };
                self.store_bytes(name, encoding, data, destination, remote.as_ref())
                    .await?
            }
            Encoding::Zarr => {
                let converted;
                let ds = match artifact {
                    Artifact::Dataset(ds) => ds,
                    Artifact::Table(table) => {
                        converted = table_to_dataset(table)?;
                        &converted
                    }
                };
                self.store_zarr(name, ds, destination, remote.as_ref()).await?
            }
        };

        info!(
            artifact = %name,
            encoding = %encoding,
            location = %result.location,
            bytes = result.bytes_written,
            "Persisted artifact"
        );
        Ok(result)
    }

    /// Persist the CO2 table in `encoding`.
    pub async fn write_co2(
        &self,
        table: &ObservationTable,
        destination: &Destination,
        encoding: Encoding,
    ) -> StorageResult<WriteResult> {
        self.write(CO2_ARTIFACT, Artifact::Table(table), destination, encoding)
            .await
    }

    /// Persist temperature anomalies: the table for row and columnar
    /// encodings, the gridded dataset for Zarr.
    pub async fn write_tempanomalies(
        &self,
        table: &ObservationTable,
        dataset: &LabeledArrayDataset,
        destination: &Destination,
        encoding: Encoding,
    ) -> StorageResult<WriteResult> {
        let artifact = match encoding {
            Encoding::Zarr => Artifact::Dataset(dataset),
            Encoding::Csv | Encoding::Parquet => Artifact::Table(table),
        };
        self.write(TEMPANOMALIES_ARTIFACT, artifact, destination, encoding)
            .await
    }

    /// Object storage client for `destination`, `None` for local ones.
    fn remote_storage(&self, destination: &Destination) -> StorageResult<Option<ObjectStorage>> {
        let Destination::ObjectStore { bucket } = destination else {
            return Ok(None);
        };
        let bucket = self.object_config.resolve_bucket(bucket.as_deref())?;

        let storage = match &self.store_override {
            Some(store) => ObjectStorage::from_store(store.clone(), bucket),
            None => ObjectStorage::new(&self.object_config, &bucket)?,
        };
        Ok(Some(storage))
    }

    async fn store_bytes(
        &self,
        name: &str,
        encoding: Encoding,
        data: Vec<u8>,
        destination: &Destination,
        remote: Option<&ObjectStorage>,
    ) -> StorageResult<WriteResult> {
        let bytes_written = data.len() as u64;

        let location = match (destination, remote) {
            (Destination::Local(dir), _) => {
                tokio::fs::create_dir_all(dir).await?;
                let path = artifact_path(dir, name, encoding);
                tokio::fs::write(&path, data).await?;
                path.display().to_string()
            }
            (Destination::ObjectStore { .. }, Some(storage)) => {
                let key = processed_key(name, encoding.extension());
                storage.put(&key, Bytes::from(data)).await?;
                storage.url(&key)
            }
            (Destination::ObjectStore { .. }, None) => {
                return Err(StorageError::Configuration(
                    "no object storage client for remote destination".to_string(),
                ))
            }
        };

        Ok(WriteResult {
            location,
            bytes_written,
            chunk_plan: None,
        })
    }

    async fn store_zarr(
        &self,
        name: &str,
        ds: &LabeledArrayDataset,
        destination: &Destination,
        remote: Option<&ObjectStorage>,
    ) -> StorageResult<WriteResult> {
        let plan = plan_chunks(ds, self.config.target_chunk_bytes())?;
        info!(
            artifact = %name,
            chunks = ?plan.iter().collect::<Vec<_>>(),
            estimated_bytes = plan.estimated_bytes(),
            "Applying chunk plan"
        );

        // Remote stores are staged under the processed directory, then uploaded
        let local_dir = match destination {
            Destination::Local(dir) => dir.as_path(),
            Destination::ObjectStore { .. } => self.config.processed_dir.as_path(),
        };
        let store_dir = artifact_path(local_dir, name, Encoding::Zarr);
        let written = ZarrWriter::new(self.config.clone()).write(&store_dir, ds, &plan)?;

        let (location, bytes_written) = match remote {
            Some(storage) => {
                let prefix = processed_key(name, Encoding::Zarr.extension());
                let uploaded = upload_directory(storage, &store_dir, &prefix).await?;
                (storage.url(&prefix), uploaded)
            }
            None => (store_dir.display().to_string(), written.bytes_written),
        };

        Ok(WriteResult {
            location,
            bytes_written,
            chunk_plan: Some(plan),
        })
    }
}

/// Local path of `<name>.<ext>` under `dir`.
pub fn artifact_path(dir: &Path, name: &str, encoding: Encoding) -> PathBuf {
    dir.join(format!("{}.{}", name, encoding.extension()))
}
