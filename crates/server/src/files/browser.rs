//! Path confinement and directory enumeration.
//!
//! Every request path is resolved against a single root directory fixed at
//! startup. Resolution is lexical first, so targets that do not exist yet
//! (upload and delete candidates) can still be named; paths that do exist
//! are canonicalized and re-checked so a symlink cannot lead outside the
//! root.

use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tracing::warn;

use super::permissions;

/// Errors that can occur while resolving or listing paths.
#[derive(Debug, Error)]
pub enum BrowserError {
    /// The resolved path escapes the served root.
    #[error("path is outside the served root: {0}")]
    PathOutsideRoot(PathBuf),

    /// The requested path does not exist.
    #[error("path not found: {0}")]
    NotFound(PathBuf),

    /// The requested path is not a directory.
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The process lacks permission to inspect the path.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// What a directory entry is, following symlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryType {
    Unknown,
    File,
    Directory,
}

impl EntryType {
    /// Sort rank: directories order before files, files before unknown.
    pub fn rank(self) -> u8 {
        match self {
            EntryType::Unknown => 0,
            EntryType::File => 1,
            EntryType::Directory => 2,
        }
    }
}

/// One entry of a directory listing, with the metadata the listing page
/// renders. Computed fresh for every request, never cached.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectoryEntry {
    /// Bare file name within its directory.
    pub name: String,
    /// Absolute path of the entry.
    pub path: PathBuf,
    /// Entry type, following symlinks.
    pub entry_type: EntryType,
    /// Whether the server process can read this entry.
    pub readable: bool,
    /// Whether the server process can modify this entry.
    pub writable: bool,
    /// Size in bytes.
    pub size: u64,
    /// Inode change time, Unix seconds.
    pub created: i64,
    /// Last modification time, Unix seconds.
    pub modified: i64,
    /// Last access time, Unix seconds.
    pub accessed: i64,
}

/// Resolves request paths beneath a fixed root and enumerates directories.
#[derive(Debug, Clone)]
pub struct DirectoryBrowser {
    root: PathBuf,
}

impl DirectoryBrowser {
    /// Create a browser rooted at `root`.
    ///
    /// The root is canonicalized once here; it must exist and be a
    /// directory.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, BrowserError> {
        let requested = root.as_ref();
        let root = requested.canonicalize().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => BrowserError::NotFound(requested.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => {
                BrowserError::PermissionDenied(requested.to_path_buf())
            }
            _ => BrowserError::Io(e),
        })?;
        if !root.is_dir() {
            return Err(BrowserError::NotADirectory(root));
        }
        Ok(Self { root })
    }

    /// The canonicalized root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a request path to an absolute path beneath the root.
    ///
    /// Resolution is purely lexical: `.` components are dropped and `..`
    /// pops the previous component. Popping past the root, or an absolute
    /// request path, is an error. The result may name a path that does not
    /// exist.
    pub fn resolve(&self, request_path: &str) -> Result<PathBuf, BrowserError> {
        let trimmed = request_path.trim_start_matches('/');
        let mut resolved = self.root.clone();
        let mut depth = 0usize;

        for component in Path::new(trimmed).components() {
            match component {
                Component::Normal(part) => {
                    resolved.push(part);
                    depth += 1;
                }
                Component::CurDir => {}
                Component::ParentDir => {
                    if depth == 0 {
                        return Err(BrowserError::PathOutsideRoot(PathBuf::from(request_path)));
                    }
                    resolved.pop();
                    depth -= 1;
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(BrowserError::PathOutsideRoot(PathBuf::from(request_path)));
                }
            }
        }

        Ok(resolved)
    }

    /// Resolve a request path that must already exist.
    ///
    /// On top of [`resolve`](Self::resolve), the path is canonicalized and
    /// the root boundary re-checked, so a symlink pointing outside the
    /// root is refused rather than followed.
    pub fn resolve_existing(&self, request_path: &str) -> Result<PathBuf, BrowserError> {
        let resolved = self.resolve(request_path)?;

        let canonical = resolved.canonicalize().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => BrowserError::NotFound(resolved.clone()),
            std::io::ErrorKind::PermissionDenied => {
                BrowserError::PermissionDenied(resolved.clone())
            }
            _ => BrowserError::Io(e),
        })?;

        if !canonical.starts_with(&self.root) {
            return Err(BrowserError::PathOutsideRoot(PathBuf::from(request_path)));
        }

        Ok(canonical)
    }

    /// The `/`-joined path of `abs` relative to the root, used in
    /// breadcrumbs and redirects. The root itself maps to an empty string.
    pub fn web_path(&self, abs: &Path) -> String {
        match abs.strip_prefix(&self.root) {
            Ok(rel) => rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/"),
            Err(_) => String::new(),
        }
    }

    /// Enumerate the immediate children of `dir`, sorted with directories
    /// first and alphabetically within each type.
    ///
    /// Entries whose metadata cannot be read at all are skipped with a
    /// warning; a broken symlink keeps its own (lstat) metadata and shows
    /// up as unknown.
    pub fn list_directory(&self, dir: &Path) -> Result<Vec<DirectoryEntry>, BrowserError> {
        let read_dir = fs::read_dir(dir).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => BrowserError::NotFound(dir.to_path_buf()),
            std::io::ErrorKind::NotADirectory => BrowserError::NotADirectory(dir.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => {
                BrowserError::PermissionDenied(dir.to_path_buf())
            }
            _ => BrowserError::Io(e),
        })?;

        let mut entries = Vec::new();
        for item in read_dir {
            let item = item?;
            let path = item.path();
            let name = item.file_name().to_string_lossy().into_owned();

            let meta = match fs::metadata(&path).or_else(|_| fs::symlink_metadata(&path)) {
                Ok(meta) => meta,
                Err(e) => {
                    warn!(path = ?path, error = %e, "skipping entry with unreadable metadata");
                    continue;
                }
            };

            let entry_type = if meta.is_file() {
                EntryType::File
            } else if meta.is_dir() {
                EntryType::Directory
            } else {
                EntryType::Unknown
            };

            entries.push(DirectoryEntry {
                readable: permissions::is_readable(&path, entry_type),
                writable: permissions::is_writable(&path, entry_type),
                size: meta.size(),
                created: meta.ctime(),
                modified: meta.mtime(),
                accessed: meta.atime(),
                entry_type,
                name,
                path,
            });
        }

        entries.sort_by(|a, b| {
            b.entry_type
                .rank()
                .cmp(&a.entry_type.rank())
                .then_with(|| a.name.cmp(&b.name))
        });

        Ok(entries)
    }
}
