//! Filesystem layer: path confinement, listings, and mutations.
//!
//! [`browser`] resolves request paths beneath the served root and
//! enumerates directories, [`permissions`] answers effective-UID access
//! questions, and [`ops`] performs uploads, deletions, and folder
//! creation.

pub mod browser;
pub mod ops;
pub mod permissions;

pub use browser::{BrowserError, DirectoryBrowser, DirectoryEntry, EntryType};
pub use ops::{OpsError, UploadSink};
