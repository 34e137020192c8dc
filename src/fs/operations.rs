//! File copy primitive
//!
//! A plain buffered copy followed by permission and mtime preservation.

use crate::error::{IoResultExt, MclubError, Result};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Copy operation statistics
#[derive(Debug, Clone, Default)]
pub struct CopyStats {
    /// Bytes copied
    pub bytes_copied: u64,
}

/// Options for file copy operations
#[derive(Debug, Clone)]
pub struct CopyOptions {
    /// Buffer size for buffered operations
    pub buffer_size: usize,
    /// Preserve file permissions
    pub preserve_permissions: bool,
    /// Preserve modification time
    pub preserve_mtime: bool,
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self {
            buffer_size: 1024 * 1024, // 1MB
            preserve_permissions: true,
            preserve_mtime: true,
        }
    }
}

/// Copies one file at a time
pub struct FileCopier {
    options: CopyOptions,
}

impl FileCopier {
    /// Create a new file copier with the given options
    pub fn new(options: CopyOptions) -> Self {
        Self { options }
    }

    /// Create with default options
    pub fn default_copier() -> Self {
        Self::new(CopyOptions::default())
    }

    /// Copy a file from source to destination, creating parent directories
    pub fn copy(&self, source: &Path, dest: &Path) -> Result<CopyStats> {
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).with_path(parent)?;
        }

        let bytes_copied = self.copy_buffered(source, dest)?;
        self.preserve_attributes(source, dest)?;

        Ok(CopyStats { bytes_copied })
    }

    fn copy_buffered(&self, source: &Path, dest: &Path) -> Result<u64> {
        let src_file = File::open(source).with_path(source)?;
        let dst_file = File::create(dest).with_path(dest)?;

        let mut reader = BufReader::with_capacity(self.options.buffer_size, src_file);
        let mut writer = BufWriter::with_capacity(self.options.buffer_size, dst_file);

        let bytes_copied =
            std::io::copy(&mut reader, &mut writer).map_err(|e| MclubError::io(source, e))?;

        writer.flush().with_path(dest)?;

        Ok(bytes_copied)
    }

    /// Preserve file attributes (permissions and mtime)
    pub fn preserve_attributes(&self, source: &Path, dest: &Path) -> Result<()> {
        let metadata = std::fs::metadata(source).with_path(source)?;

        if self.options.preserve_permissions {
            std::fs::set_permissions(dest, metadata.permissions()).with_path(dest)?;
        }

        if self.options.preserve_mtime {
            // Timestamps are best effort; some filesystems reject utimes.
            if let Ok(mtime) = metadata.modified() {
                let _ = filetime::set_file_mtime(dest, filetime::FileTime::from_system_time(mtime));
            }
            if let Ok(atime) = metadata.accessed() {
                let _ = filetime::set_file_atime(dest, filetime::FileTime::from_system_time(atime));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, name: &str, size: usize) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(&vec![0xABu8; size]).unwrap();
        path
    }

    #[test]
    fn test_copy_small_file() {
        let src_dir = TempDir::new().unwrap();
        let dst_dir = TempDir::new().unwrap();

        let src = create_test_file(src_dir.path(), "test.txt", 1024);
        let dst = dst_dir.path().join("test.txt");

        let copier = FileCopier::default_copier();
        let stats = copier.copy(&src, &dst).unwrap();

        assert_eq!(stats.bytes_copied, 1024);
        assert_eq!(std::fs::metadata(&dst).unwrap().len(), 1024);
    }

    #[test]
    fn test_copy_empty_file() {
        let src_dir = TempDir::new().unwrap();
        let dst_dir = TempDir::new().unwrap();

        let src = create_test_file(src_dir.path(), "empty.txt", 0);
        let dst = dst_dir.path().join("empty.txt");

        let stats = FileCopier::default_copier().copy(&src, &dst).unwrap();

        assert_eq!(stats.bytes_copied, 0);
        assert!(dst.exists());
    }

    #[test]
    fn test_copy_creates_parent_dirs() {
        let src_dir = TempDir::new().unwrap();
        let dst_dir = TempDir::new().unwrap();

        let src = create_test_file(src_dir.path(), "test.txt", 100);
        let dst = dst_dir.path().join("a/b/c/test.txt");

        FileCopier::default_copier().copy(&src, &dst).unwrap();

        assert!(dst.exists());
    }

    #[test]
    fn test_copy_preserves_mtime() {
        let src_dir = TempDir::new().unwrap();
        let dst_dir = TempDir::new().unwrap();

        let src = create_test_file(src_dir.path(), "old.txt", 10);
        let old = filetime::FileTime::from_unix_time(1_000_000_000, 0);
        filetime::set_file_mtime(&src, old).unwrap();

        let dst = dst_dir.path().join("old.txt");
        FileCopier::default_copier().copy(&src, &dst).unwrap();

        let meta = std::fs::metadata(&dst).unwrap();
        assert_eq!(filetime::FileTime::from_last_modification_time(&meta), old);
    }

    #[test]
    fn test_copy_missing_source_fails_with_path() {
        let dst_dir = TempDir::new().unwrap();
        let missing = dst_dir.path().join("missing.txt");

        let err = FileCopier::default_copier()
            .copy(&missing, &dst_dir.path().join("out.txt"))
            .unwrap_err();

        match err {
            MclubError::Io { path, .. } => assert_eq!(path, missing),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
