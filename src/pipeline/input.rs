//! Stage folders: list what a stage should consume, create where it writes.
//!
//! Listings are sorted so a batch is processed in the same order on every
//! platform; only regular files are returned.

use crate::error::RecipeScanError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// List regular files in `dir`, optionally filtered by extension
/// (case-insensitive, without the dot).
pub async fn list_files(
    dir: &Path,
    extension: Option<&str>,
) -> Result<Vec<PathBuf>, RecipeScanError> {
    let read_err = |source| RecipeScanError::DirectoryRead {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(read_err)?;
    let mut files = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(read_err)? {
        let file_type = entry.file_type().await.map_err(read_err)?;
        if !file_type.is_file() {
            continue;
        }
        let path = entry.path();
        if let Some(ext) = extension {
            if !has_extension(&path, ext) {
                continue;
            }
        }
        files.push(path);
    }

    files.sort();
    debug!("{}: {} file(s) selected", dir.display(), files.len());
    Ok(files)
}

/// Create `dir` and its parents if missing.
pub async fn ensure_dir(dir: &Path) -> Result<(), RecipeScanError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| RecipeScanError::DirectoryCreate {
            path: dir.to_path_buf(),
            source,
        })
}

pub fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

/// File name for logs and report items.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
