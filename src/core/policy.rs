//! Overwrite policy evaluation

use crate::config::OverwriteMode;
use crate::fs::FileEntry;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::SystemTime;

/// The two facts the overwrite rules look at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStamp {
    /// Size in bytes
    pub size: u64,
    /// Last modification time
    pub modified: SystemTime,
}

impl FileStamp {
    /// Stamp from filesystem metadata
    pub fn from_metadata(metadata: &std::fs::Metadata) -> Self {
        Self {
            size: metadata.len(),
            modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        }
    }
}

impl From<&FileEntry> for FileStamp {
    fn from(entry: &FileEntry) -> Self {
        Self {
            size: entry.size,
            modified: entry.modified,
        }
    }
}

/// Should an existing destination be replaced by the source?
///
/// Strict comparisons only: equal timestamps are not "newer" and equal
/// sizes are not "larger".
pub fn should_overwrite(source: &FileStamp, dest: &FileStamp, mode: OverwriteMode) -> bool {
    let newer = source.modified > dest.modified;
    let larger = source.size > dest.size;

    match mode {
        OverwriteMode::Newer => newer,
        OverwriteMode::Larger => larger,
        OverwriteMode::Either => newer || larger,
        OverwriteMode::Never => false,
    }
}

/// What the executor will do with one task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverwriteDecision {
    /// Destination absent, copy
    Create,
    /// Destination present and the policy says replace it
    Overwrite,
    /// Destination present and kept
    Skip,
}

impl OverwriteDecision {
    /// Will the executor write this file?
    pub fn writes(&self) -> bool {
        !matches!(self, Self::Skip)
    }
}

/// Look at `destination` on disk and decide for `source`.
pub fn decide(source: &FileEntry, destination: &Path, mode: OverwriteMode) -> OverwriteDecision {
    match std::fs::metadata(destination) {
        Ok(metadata) => {
            let dest = FileStamp::from_metadata(&metadata);
            if should_overwrite(&FileStamp::from(source), &dest, mode) {
                OverwriteDecision::Overwrite
            } else {
                OverwriteDecision::Skip
            }
        }
        Err(_) => OverwriteDecision::Create,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::time::Duration;

    fn stamp(size: u64, secs: u64) -> FileStamp {
        FileStamp {
            size,
            modified: SystemTime::UNIX_EPOCH + Duration::from_secs(secs),
        }
    }

    #[test]
    fn test_equal_timestamps_are_not_newer() {
        let a = stamp(10, 500);
        assert!(!should_overwrite(&a, &a, OverwriteMode::Newer));
        assert!(!should_overwrite(&a, &a, OverwriteMode::Larger));
        assert!(!should_overwrite(&a, &a, OverwriteMode::Either));
    }

    #[test]
    fn test_never_keeps_destination() {
        assert!(!should_overwrite(&stamp(99, 99), &stamp(1, 1), OverwriteMode::Never));
    }

    #[test]
    fn test_decide_against_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let dest = dir.path().join("dest.txt");
        let source = FileEntry {
            path: dir.path().join("src.txt"),
            size: 5,
            modified: SystemTime::UNIX_EPOCH + Duration::from_secs(2_000_000_000),
        };

        assert_eq!(decide(&source, &dest, OverwriteMode::Never), OverwriteDecision::Create);

        std::fs::write(&dest, b"0123456789").unwrap();
        filetime::set_file_mtime(&dest, filetime::FileTime::from_unix_time(1_000_000_000, 0))
            .unwrap();

        assert_eq!(decide(&source, &dest, OverwriteMode::Never), OverwriteDecision::Skip);
        assert_eq!(decide(&source, &dest, OverwriteMode::Larger), OverwriteDecision::Skip);
        assert_eq!(decide(&source, &dest, OverwriteMode::Newer), OverwriteDecision::Overwrite);
        assert_eq!(decide(&source, &dest, OverwriteMode::Either), OverwriteDecision::Overwrite);
    }

    proptest! {
        #[test]
        fn prop_newer_is_strict_mtime(src_t in 0u64..1_000_000, dst_t in 0u64..1_000_000, s in 0u64..100, d in 0u64..100) {
            let src = stamp(s, src_t);
            let dst = stamp(d, dst_t);
            prop_assert_eq!(should_overwrite(&src, &dst, OverwriteMode::Newer), src_t > dst_t);
        }

        #[test]
        fn prop_larger_is_strict_size(s in 0u64..10_000, d in 0u64..10_000, t in 0u64..1000) {
            prop_assert_eq!(should_overwrite(&stamp(s, t), &stamp(d, t), OverwriteMode::Larger), s > d);
        }

        #[test]
        fn prop_either_is_or(src_t in 0u64..1000, dst_t in 0u64..1000, s in 0u64..1000, d in 0u64..1000) {
            let src = stamp(s, src_t);
            let dst = stamp(d, dst_t);
            let newer = should_overwrite(&src, &dst, OverwriteMode::Newer);
            let larger = should_overwrite(&src, &dst, OverwriteMode::Larger);
            prop_assert_eq!(should_overwrite(&src, &dst, OverwriteMode::Either), newer || larger);
        }
    }
}
