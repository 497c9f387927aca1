//! Effective-UID permission checks for served paths.
//!
//! Checks go through `access(2)` so they reflect what the process can
//! actually do, including ACLs and supplementary groups, rather than a
//! reimplementation of mode-bit logic.

use std::path::Path;

use nix::unistd::AccessFlags;

use super::browser::EntryType;

/// Whether the current process can read a path of the given type.
///
/// Directories additionally need execute permission so their contents
/// can be enumerated and traversed.
pub fn is_readable(path: &Path, entry_type: EntryType) -> bool {
    let flags = match entry_type {
        EntryType::File => AccessFlags::R_OK,
        EntryType::Directory => AccessFlags::R_OK | AccessFlags::X_OK,
        EntryType::Unknown => return false,
    };
    nix::unistd::access(path, flags).is_ok()
}

/// Whether the current process can modify a path of the given type.
///
/// Modifying a directory (creating, renaming, or deleting children)
/// requires read and execute permission on top of write.
pub fn is_writable(path: &Path, entry_type: EntryType) -> bool {
    let flags = match entry_type {
        EntryType::File => AccessFlags::W_OK,
        EntryType::Directory => AccessFlags::W_OK | AccessFlags::R_OK | AccessFlags::X_OK,
        EntryType::Unknown => return false,
    };
    nix::unistd::access(path, flags).is_ok()
}

/// Classify a path by following symlinks, as the listing does.
pub fn path_type(path: &Path) -> EntryType {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => EntryType::File,
        Ok(meta) if meta.is_dir() => EntryType::Directory,
        _ => EntryType::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    #[test]
    fn test_file_readable_and_writable() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("data.txt");
        fs::write(&file_path, b"contents").unwrap();

        assert!(is_readable(&file_path, EntryType::File));
        assert!(is_writable(&file_path, EntryType::File));
    }

    #[test]
    fn test_directory_readable_and_writable() {
        let temp_dir = TempDir::new().unwrap();
        let dir_path = temp_dir.path().join("subdir");
        fs::create_dir(&dir_path).unwrap();

        assert!(is_readable(&dir_path, EntryType::Directory));
        assert!(is_writable(&dir_path, EntryType::Directory));
    }

    #[test]
    fn test_unknown_type_is_never_accessible() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("data.txt");
        fs::write(&file_path, b"contents").unwrap();

        assert!(!is_readable(&file_path, EntryType::Unknown));
        assert!(!is_writable(&file_path, EntryType::Unknown));
    }

    #[test]
    fn test_unreadable_file() {
        // access() always succeeds for root, skip when running as root
        if nix::unistd::geteuid().is_root() {
            return;
        }

        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("locked.txt");
        fs::write(&file_path, b"contents").unwrap();
        fs::set_permissions(&file_path, fs::Permissions::from_mode(0o000)).unwrap();

        assert!(!is_readable(&file_path, EntryType::File));
        assert!(!is_writable(&file_path, EntryType::File));
    }

    #[test]
    fn test_readonly_directory_is_not_writable() {
        if nix::unistd::geteuid().is_root() {
            return;
        }

        let temp_dir = TempDir::new().unwrap();
        let dir_path = temp_dir.path().join("frozen");
        fs::create_dir(&dir_path).unwrap();
        fs::set_permissions(&dir_path, fs::Permissions::from_mode(0o555)).unwrap();

        assert!(is_readable(&dir_path, EntryType::Directory));
        assert!(!is_writable(&dir_path, EntryType::Directory));

        fs::set_permissions(&dir_path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    fn test_path_type_classification() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("file.txt");
        fs::write(&file_path, b"x").unwrap();
        let dir_path = temp_dir.path().join("dir");
        fs::create_dir(&dir_path).unwrap();

        assert_eq!(path_type(&file_path), EntryType::File);
        assert_eq!(path_type(&dir_path), EntryType::Directory);
        assert_eq!(
            path_type(&temp_dir.path().join("missing")),
            EntryType::Unknown
        );
    }
}
