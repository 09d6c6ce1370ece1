//! Upload of locally staged Zarr stores.

use std::path::Path;

use bytes::Bytes;
use tracing::debug;

use crate::error::{StorageError, StorageResult};
use crate::object_store::ObjectStorage;

/// Upload every file under `local_path` to `storage_prefix`, keeping the
/// relative layout.
///
/// Returns the total bytes uploaded.
pub async fn upload_directory(
    storage: &ObjectStorage,
    local_path: &Path,
    storage_prefix: &str,
) -> StorageResult<u64> {
    let mut total_size = 0u64;

    for entry in walkdir::WalkDir::new(local_path).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative_path = entry
            .path()
            .strip_prefix(local_path)
            .map_err(|e| StorageError::object_store(e.to_string()))?;
        let relative_key: Vec<String> = relative_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        let storage_path = format!("{}/{}", storage_prefix, relative_key.join("/"));

        let file_data = tokio::fs::read(entry.path()).await?;
        let file_size = file_data.len() as u64;
        total_size += file_size;

        storage.put(&storage_path, Bytes::from(file_data)).await?;

        debug!(path = %storage_path, size = file_size, "Uploaded file");
    }

    Ok(total_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::memory::InMemory;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_upload_keeps_relative_layout() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("co2.zarr");
        std::fs::create_dir_all(root.join("xco2/c/0")).unwrap();
        std::fs::write(root.join("zarr.json"), b"{}").unwrap();
        std::fs::write(root.join("xco2/zarr.json"), b"{\"a\":1}").unwrap();
        std::fs::write(root.join("xco2/c/0/0"), b"1234").unwrap();

        let storage = ObjectStorage::from_store(Arc::new(InMemory::new()), "obs");
        let bytes = upload_directory(&storage, &root, "processed/co2.zarr")
            .await
            .unwrap();

        assert_eq!(bytes, 2 + 7 + 4);
        assert_eq!(
            storage.list("processed/co2.zarr").await.unwrap(),
            vec![
                "processed/co2.zarr/xco2/c/0/0".to_string(),
                "processed/co2.zarr/xco2/zarr.json".to_string(),
                "processed/co2.zarr/zarr.json".to_string(),
            ]
        );
    }
}
