//! Object storage interface for processed artifacts (MinIO/S3 compatible).

use bytes::Bytes;
use object_store::{aws::AmazonS3Builder, path::Path, ObjectStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::error::{StorageError, StorageResult};

/// Key prefix every processed artifact is stored under.
pub const PROCESSED_PREFIX: &str = "processed";

/// Configuration for object storage connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectStorageConfig {
    /// S3/MinIO endpoint URL
    pub endpoint: String,
    /// Default bucket. Remote writes fail when neither this nor a per-call
    /// override is set.
    pub bucket: Option<String>,
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// AWS region (use "us-east-1" for MinIO)
    pub region: String,
    /// Allow HTTP (for local MinIO)
    pub allow_http: bool,
}

impl Default for ObjectStorageConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9000".to_string(),
            bucket: None,
            access_key_id: "minioadmin".to_string(),
            secret_access_key: "minioadmin".to_string(),
            region: "us-east-1".to_string(),
            allow_http: true,
        }
    }
}

impl ObjectStorageConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("S3_ENDPOINT") {
            config.endpoint = val;
        }

        if let Ok(val) = std::env::var("S3_BUCKET") {
            if !val.is_empty() {
                config.bucket = Some(val);
            }
        }

        if let Ok(val) = std::env::var("S3_ACCESS_KEY") {
            config.access_key_id = val;
        }

        if let Ok(val) = std::env::var("S3_SECRET_KEY") {
            config.secret_access_key = val;
        }

        if let Ok(val) = std::env::var("S3_REGION") {
            config.region = val;
        }

        if let Ok(val) = std::env::var("S3_ALLOW_HTTP") {
            config.allow_http = val.to_lowercase() == "true" || val == "1";
        }

        config
    }

    /// Bucket to use: the override if given, else the configured default.
    pub fn resolve_bucket(&self, bucket_override: Option<&str>) -> StorageResult<String> {
        bucket_override
            .map(str::to_string)
            .or_else(|| self.bucket.clone())
            .filter(|b| !b.is_empty())
            .ok_or_else(|| {
                StorageError::Configuration(
                    "object storage destination requires a bucket (set S3_BUCKET or pass one)"
                        .to_string(),
                )
            })
    }
}

/// Object storage client scoped to one bucket.
pub struct ObjectStorage {
    store: Arc<dyn ObjectStore>,
    bucket: String,
}

impl ObjectStorage {
    /// Create an S3 client for `bucket` from config.
    pub fn new(config: &ObjectStorageConfig, bucket: &str) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::new()
            .with_endpoint(&config.endpoint)
            .with_bucket_name(bucket)
            .with_access_key_id(&config.access_key_id)
            .with_secret_access_key(&config.secret_access_key)
            .with_region(&config.region);

        if config.allow_http {
            builder = builder.with_allow_http(true);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::object_store(format!("Failed to create S3 client: {}", e)))?;

        Ok(Self {
            store: Arc::new(store),
            bucket: bucket.to_string(),
        })
    }

    /// Wrap an existing store, e.g. an in-memory one.
    pub fn from_store(store: Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// URL of `key` in this bucket.
    pub fn url(&self, key: &str) -> String {
        format!("s3://{}/{}", self.bucket, key)
    }

    /// Write bytes to a path in the bucket.
    #[instrument(skip(self, data), fields(bucket = %self.bucket, path = %path))]
    pub async fn put(&self, path: &str, data: Bytes) -> StorageResult<()> {
        let location = Path::from(path);
        debug!(size = data.len(), "Writing object");

        self.store
            .put(&location, data.into())
            .await
            .map_err(|e| StorageError::object_store(format!("Failed to write {}: {}", path, e)))?;

        Ok(())
    }

    /// Read bytes from a path.
    #[instrument(skip(self), fields(bucket = %self.bucket, path = %path))]
    pub async fn get(&self, path: &str) -> StorageResult<Bytes> {
        let location = Path::from(path);

        let result = self
            .store
            .get(&location)
            .await
            .map_err(|e| StorageError::object_store(format!("Failed to read {}: {}", path, e)))?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| StorageError::object_store(format!("Failed to read bytes: {}", e)))?;

        debug!(size = bytes.len(), "Read object");
        Ok(bytes)
    }

    /// List objects with a given prefix.
    pub async fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        use futures::TryStreamExt;

        let prefix_path = Path::from(prefix);
        let mut paths = Vec::new();

        let mut stream = self.store.list(Some(&prefix_path));
        while let Some(meta) = stream
            .try_next()
            .await
            .map_err(|e| StorageError::object_store(format!("List failed: {}", e)))?
        {
            paths.push(meta.location.to_string());
        }

        paths.sort();
        Ok(paths)
    }
}

/// Key of a processed artifact: `processed/<name>.<ext>`.
pub fn processed_key(name: &str, extension: &str) -> String {
    format!("{}/{}.{}", PROCESSED_PREFIX, name, extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::memory::InMemory;

    #[test]
    fn test_processed_key() {
        assert_eq!(processed_key("co2", "parquet"), "processed/co2.parquet");
        assert_eq!(processed_key("tempanomalies", "zarr"), "processed/tempanomalies.zarr");
    }

    #[test]
    fn test_resolve_bucket() {
        let mut config = ObjectStorageConfig::default();
        assert!(matches!(
            config.resolve_bucket(None),
            Err(StorageError::Configuration(_))
        ));
        assert_eq!(config.resolve_bucket(Some("override")).unwrap(), "override");

        config.bucket = Some("default".to_string());
        assert_eq!(config.resolve_bucket(None).unwrap(), "default");
        assert_eq!(config.resolve_bucket(Some("override")).unwrap(), "override");
    }

    #[tokio::test]
    async fn test_put_get_list() {
        let storage = ObjectStorage::from_store(Arc::new(InMemory::new()), "obs");
        storage
            .put("processed/co2.csv", Bytes::from_static(b"time\tlat\n"))
            .await
            .unwrap();

        assert_eq!(
            storage.get("processed/co2.csv").await.unwrap(),
            Bytes::from_static(b"time\tlat\n")
        );
        assert_eq!(
            storage.list("processed").await.unwrap(),
            vec!["processed/co2.csv".to_string()]
        );
        assert_eq!(storage.url("processed/co2.csv"), "s3://obs/processed/co2.csv");
    }
}
