//! Blocking filesystem operations used by [`StorageProgram`](super::StorageProgram).

use std::fs;
use std::path::{Path, PathBuf};

use crate::dispatch::Worker;
use crate::error::ApiError;

/// Where a copy of `source` lands inside `dir`. Path separators in the
/// file name are replaced so the copy stays directly inside `dir`.
pub fn target_path(source: &Path, dir: &Path) -> Result<PathBuf, ApiError> {
    let name = source
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| ApiError::Resolver {
            uri: source.display().to_string(),
        })?;
    Ok(dir.join(name.replace(['/', '\\'], "_")))
}

/// Copies `source` into `dir`, creating the directory when needed, and
/// returns the path of the copy.
pub fn copy_into(worker: &Worker, source: &Path, dir: &Path) -> Result<PathBuf, ApiError> {
    fs::create_dir_all(dir).map_err(|e| ApiError::from_io(dir.display().to_string(), &e))?;
    let target = target_path(source, dir)?;
    copy_to(worker, source, &target)
}

/// Copies `source` to exactly `target`, replacing an existing file.
pub fn copy_to(_worker: &Worker, source: &Path, target: &Path) -> Result<PathBuf, ApiError> {
    fs::copy(source, target).map_err(|e| {
        let location = if source.exists() { target } else { source };
        ApiError::from_io(location.display().to_string(), &e)
    })?;
    tracing::debug!(from = %source.display(), to = %target.display(), "copied");
    Ok(target.to_path_buf())
}

/// Reads a stored copy back as text.
pub fn read_text(_worker: &Worker, path: &Path) -> Result<String, ApiError> {
    fs::read_to_string(path).map_err(|e| ApiError::from_io(path.display().to_string(), &e))
}
