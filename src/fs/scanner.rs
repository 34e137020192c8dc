//! Source enumeration
//!
//! Expands the user's selection (any mix of files and directories) into a
//! flat, sorted, de-duplicated list of regular files with their metadata.

use crate::core::CopyFailure;
use crate::error::{MclubError, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

/// Metadata for a single source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Absolute path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Modification time
    pub modified: SystemTime,
}

impl FileEntry {
    /// Create a FileEntry from a path
    pub fn from_path(path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path).map_err(|e| MclubError::io(path, e))?;

        Ok(FileEntry {
            path: path.to_path_buf(),
            size: metadata.len(),
            modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        })
    }
}

/// Everything the enumerator found for one selection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceListing {
    /// Regular files, sorted by path, no duplicates
    pub files: Vec<FileEntry>,
    /// Total size of all files
    pub total_size: u64,
    /// Entries that could not be read; the run goes on without them
    pub errors: Vec<CopyFailure>,
}

impl SourceListing {
    /// Number of files found
    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

/// Make a path absolute without resolving symlinks.
pub fn absolutize(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).map_err(|e| MclubError::io(path, e))
}

/// Enumerate every regular file reachable from `sources`.
///
/// Directories are walked recursively (following symlinks, like a plain
/// directory walk in a file manager). A file listed twice, directly or
/// through overlapping directories, appears once. Missing sources and
/// unreadable entries are reported in [`SourceListing::errors`].
pub fn enumerate_sources(sources: &[PathBuf]) -> Result<SourceListing> {
    let mut paths = BTreeSet::new();
    let mut errors = Vec::new();

    for source in sources {
        let source = absolutize(source)?;

        if !source.exists() {
            tracing::warn!("Source does not exist: {}", source.display());
            errors.push(CopyFailure::new(
                &source,
                MclubError::NotFound(source.clone()).to_string(),
            ));
            continue;
        }

        if source.is_file() {
            paths.insert(source);
            continue;
        }

        for entry in WalkDir::new(&source).follow_links(true) {
            match entry {
                Ok(e) if e.file_type().is_file() => {
                    paths.insert(e.into_path());
                }
                Ok(_) => {}
                Err(err) => {
                    let path = err
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| source.clone());
                    tracing::warn!("Cannot read {}: {}", path.display(), err);
                    errors.push(CopyFailure::new(&path, err.to_string()));
                }
            }
        }
    }

    // Stat in parallel; BTreeSet order survives the indexed collect.
    let paths: Vec<PathBuf> = paths.into_iter().collect();
    let results: Vec<Result<FileEntry>> =
        paths.par_iter().map(|p| FileEntry::from_path(p)).collect();

    let mut files = Vec::with_capacity(results.len());
    for (path, result) in paths.iter().zip(results) {
        match result {
            Ok(entry) => files.push(entry),
            Err(err) => errors.push(CopyFailure::new(path, err.to_string())),
        }
    }

    let total_size = files.iter().map(|f| f.size).sum();
    tracing::info!(
        "Enumerated {} files ({} bytes) from {} sources",
        files.len(),
        total_size,
        sources.len()
    );

    Ok(SourceListing {
        files,
        total_size,
        errors,
    })
}
