//! Input discovery under the raw-data directory.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{IngestionError, Result};

/// Files directly under `dir` whose name starts with `prefix` and ends in
/// `.{extension}`, sorted by name.
///
/// Fails with [`IngestionError::NoInputFiles`] when nothing matches,
/// including when `dir` does not exist.
pub fn discover_files(dir: &Path, prefix: &str, extension: &str) -> Result<Vec<PathBuf>> {
    let pattern = format!("{}*.{}", prefix, extension);
    let no_input = || IngestionError::NoInputFiles {
        dir: dir.to_path_buf(),
        pattern: pattern.clone(),
    };

    if !dir.is_dir() {
        return Err(no_input());
    }

    let suffix = format!(".{}", extension);
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if name.starts_with(prefix) && name.ends_with(&suffix) {
            files.push(entry.path().to_path_buf());
        }
    }

    if files.is_empty() {
        return Err(no_input());
    }

    files.sort();
    debug!(dir = %dir.display(), pattern = %pattern, count = files.len(), "Discovered input files");
    Ok(files)
}
