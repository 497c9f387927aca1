//! Display formatting for listing cells.

use chrono::{Local, TimeZone};

use crate::files::{DirectoryEntry, EntryType};

const SIZE_UNITS: [&str; 8] = ["", "K", "M", "G", "T", "P", "E", "Z"];

/// Render a byte count with one decimal place and a 1024-based unit
/// suffix, e.g. `512.0`, `1.5K`, `2.0M`.
pub fn format_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    for unit in SIZE_UNITS {
        if value < 1024.0 {
            return format!("{value:3.1}{unit}");
        }
        value /= 1024.0;
    }
    format!("{value:.1}Y")
}

/// Render Unix seconds as local `YYYY-MM-DD HH:MM:SS`.
pub fn format_timestamp(secs: i64) -> String {
    match Local.timestamp_opt(secs, 0) {
        chrono::LocalResult::Single(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        _ => "-".to_string(),
    }
}

/// Entry name with its type marker: directories get a trailing `/`,
/// unknown entries a `?`.
pub fn display_name(entry: &DirectoryEntry) -> String {
    match entry.entry_type {
        EntryType::File => entry.name.clone(),
        EntryType::Directory => format!("{}/", entry.name),
        EntryType::Unknown => format!("{}?", entry.name),
    }
}

/// Size cell: files show a human-readable size, everything else a dash.
pub fn display_size(entry: &DirectoryEntry) -> String {
    match entry.entry_type {
        EntryType::File => format_size(entry.size),
        _ => "-".to_string(),
    }
}

/// Permission cell: `R` and/or `W`, or a dash for neither.
pub fn display_permissions(entry: &DirectoryEntry) -> String {
    let mut label = String::new();
    if entry.readable {
        label.push('R');
    }
    if entry.writable {
        label.push('W');
    }
    if label.is_empty() {
        label.push('-');
    }
    label
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn entry(entry_type: EntryType, readable: bool, writable: bool, size: u64) -> DirectoryEntry {
        DirectoryEntry {
            name: "item".to_string(),
            path: PathBuf::from("/srv/item"),
            entry_type,
            readable,
            writable,
            size,
            created: 1_700_000_000,
            modified: 1_700_000_000,
            accessed: 1_700_000_000,
        }
    }

    #[test]
    fn test_format_size_below_one_kilobyte() {
        assert_eq!(format_size(0), "0.0");
        assert_eq!(format_size(512), "512.0");
        assert_eq!(format_size(1023), "1023.0");
    }

    #[test]
    fn test_format_size_scales_by_1024() {
        assert_eq!(format_size(1024), "1.0K");
        assert_eq!(format_size(1536), "1.5K");
        assert_eq!(format_size(1024 * 1024), "1.0M");
        assert_eq!(format_size(10 * 1024 * 1024 * 1024), "10.0G");
    }

    #[test]
    fn test_format_size_largest_values() {
        // u64::MAX is 16 EiB
        assert_eq!(format_size(u64::MAX), "16.0E");
    }

    #[test]
    fn test_format_timestamp_shape() {
        let formatted = format_timestamp(1_700_000_000);
        assert_eq!(formatted.len(), 19);
        assert!(
            chrono::NaiveDateTime::parse_from_str(&formatted, "%Y-%m-%d %H:%M:%S").is_ok(),
            "unexpected timestamp shape: {formatted}"
        );
    }

    #[test]
    fn test_display_name_markers() {
        assert_eq!(display_name(&entry(EntryType::File, true, true, 1)), "item");
        assert_eq!(
            display_name(&entry(EntryType::Directory, true, true, 1)),
            "item/"
        );
        assert_eq!(
            display_name(&entry(EntryType::Unknown, false, false, 1)),
            "item?"
        );
    }

    #[test]
    fn test_display_size_only_for_files() {
        assert_eq!(display_size(&entry(EntryType::File, true, true, 2048)), "2.0K");
        assert_eq!(display_size(&entry(EntryType::Directory, true, true, 4096)), "-");
        assert_eq!(display_size(&entry(EntryType::Unknown, false, false, 0)), "-");
    }

    #[test]
    fn test_display_permissions_labels() {
        assert_eq!(display_permissions(&entry(EntryType::File, true, true, 1)), "RW");
        assert_eq!(display_permissions(&entry(EntryType::File, true, false, 1)), "R");
        assert_eq!(display_permissions(&entry(EntryType::File, false, true, 1)), "W");
        assert_eq!(display_permissions(&entry(EntryType::File, false, false, 1)), "-");
    }
}
