//! Mutating filesystem operations: uploads, deletions, folder creation.
//!
//! Uploads stream into a hidden `.part` sibling and are renamed into place
//! once complete, so a partially received file never appears under its
//! final name. Deletions are best-effort per entry; callers report the
//! per-entry outcome instead of failing wholesale.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::warn;
use uuid::Uuid;

/// Errors from mutating operations.
#[derive(Debug, Error)]
pub enum OpsError {
    /// The upload target is missing or not a directory.
    #[error("target is not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The process lacks permission to write the target.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The creation target already exists.
    #[error("target already exists: {0}")]
    AlreadyExists(PathBuf),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn io_to_ops(e: std::io::Error, path: &Path) -> OpsError {
    if e.kind() == std::io::ErrorKind::PermissionDenied {
        OpsError::PermissionDenied(path.to_path_buf())
    } else {
        OpsError::Io(e)
    }
}

/// Reduce a client-supplied file name to a safe basename.
///
/// Takes the final path component (either separator style), maps anything
/// outside `[A-Za-z0-9._-]` to `_`, and strips leading dots so the result
/// can neither traverse nor hide itself. Returns `None` when nothing
/// usable remains.
pub fn sanitize_file_name(raw: &str) -> Option<String> {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// An upload in progress: a temporary file that becomes visible under its
/// final name only on [`finish`](Self::finish).
pub struct UploadSink {
    file: tokio::fs::File,
    temp_path: PathBuf,
    final_path: PathBuf,
}

impl UploadSink {
    /// Open a temporary `.part` file in `dir` for streaming `file_name`.
    ///
    /// `dir` must be an existing directory; a missing target maps to
    /// [`OpsError::NotADirectory`] as well, since the caller named a
    /// directory that is not one.
    pub async fn begin(dir: &Path, file_name: &str) -> Result<Self, OpsError> {
        match tokio::fs::metadata(dir).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(OpsError::NotADirectory(dir.to_path_buf())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(OpsError::NotADirectory(dir.to_path_buf()));
            }
            Err(e) => return Err(io_to_ops(e, dir)),
        }

        let final_path = dir.join(file_name);
        let temp_path = dir.join(format!(".upload-{}.part", Uuid::new_v4()));

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)
            .await
            .map_err(|e| io_to_ops(e, dir))?;

        Ok(Self {
            file,
            temp_path,
            final_path,
        })
    }

    /// Append a chunk to the temporary file.
    pub async fn write(&mut self, chunk: &[u8]) -> Result<(), OpsError> {
        self.file
            .write_all(chunk)
            .await
            .map_err(|e| io_to_ops(e, &self.temp_path))
    }

    /// Flush and atomically rename the temporary file into place.
    pub async fn finish(self) -> Result<PathBuf, OpsError> {
        let UploadSink {
            mut file,
            temp_path,
            final_path,
        } = self;

        if let Err(e) = file.flush().await {
            drop(file);
            cleanup_temp(&temp_path).await;
            return Err(io_to_ops(e, &temp_path));
        }
        drop(file);

        if let Err(e) = tokio::fs::rename(&temp_path, &final_path).await {
            cleanup_temp(&temp_path).await;
            return Err(io_to_ops(e, &final_path));
        }

        Ok(final_path)
    }

    /// Discard the partial upload and remove the temporary file.
    pub async fn abort(self) {
        let UploadSink {
            file, temp_path, ..
        } = self;
        drop(file);
        cleanup_temp(&temp_path).await;
    }
}

async fn cleanup_temp(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        warn!(path = ?path, error = %e, "failed to remove temporary upload file");
    }
}

/// Remove a single entry best-effort and report whether it is gone.
///
/// Directories are removed recursively; symlinks are removed themselves,
/// never their targets. Errors are logged and swallowed. The return value
/// reflects whether the path still exists afterwards, so an entry that
/// never existed reports `false`.
pub fn remove_entry(path: &Path) -> bool {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(_) => return false,
    };

    let result = if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    if let Err(e) = result {
        warn!(path = ?path, error = %e, "failed to delete entry");
    }

    fs::symlink_metadata(path).is_err()
}

/// Create a directory tree at `path`, which must not exist yet.
pub fn create_folder(path: &Path) -> Result<(), OpsError> {
    if path.exists() {
        return Err(OpsError::AlreadyExists(path.to_path_buf()));
    }
    fs::create_dir_all(path)?;
    Ok(())
}
