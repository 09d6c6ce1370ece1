//! Scratch directory helpers.
//!
//! Tests build a throwaway data root laid out the way the ingester expects:
//! `<root>/raw` for input files and `<root>/processed` for artifacts.

use std::path::PathBuf;

/// Creates a temporary directory for test output.
///
/// The directory is removed when the returned `TempDir` is dropped.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temporary test directory")
}

/// Creates a temporary directory with a specific prefix.
pub fn temp_test_dir_with_prefix(prefix: &str) -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .expect("Failed to create temporary test directory")
}

/// Creates `<root>/raw` and returns its path.
pub fn raw_dir(root: &tempfile::TempDir) -> PathBuf {
    let dir = root.path().join("raw");
    std::fs::create_dir_all(&dir).expect("Failed to create raw data directory");
    dir
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_test_dir_with_prefix() {
        let dir = temp_test_dir_with_prefix("obs_test_");
        let path_str = dir.path().to_string_lossy();
        assert!(path_str.contains("obs_test_"));
    }

    #[test]
    fn test_raw_dir_created() {
        let root = temp_test_dir();
        let raw = raw_dir(&root);
        assert!(raw.is_dir());
        assert!(raw.ends_with("raw"));
    }
}
