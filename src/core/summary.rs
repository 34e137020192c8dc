//! Run summary

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize, Serializer};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// One file that could not be read or copied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyFailure {
    /// Source (or unreadable directory) path
    pub path: PathBuf,
    /// User-facing error text
    pub message: String,
}

impl CopyFailure {
    /// Create a failure record
    pub fn new(path: &Path, message: impl Into<String>) -> Self {
        Self {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}

fn duration_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

/// Outcome of one run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Files written to the destination
    pub files_copied: u64,
    /// Files left alone because the destination was kept
    pub files_skipped: u64,
    /// Bytes written
    pub bytes_copied: u64,
    /// Per-file failures, in the order they happened
    pub errors: Vec<CopyFailure>,
    /// Stopped early on request
    pub cancelled: bool,
    /// Wall-clock start
    pub started_at: DateTime<Local>,
    /// Total duration
    #[serde(rename = "duration_secs", serialize_with = "duration_secs")]
    pub duration: Duration,
}

impl Default for RunSummary {
    fn default() -> Self {
        Self::new()
    }
}

impl RunSummary {
    /// Empty summary stamped with the current time
    pub fn new() -> Self {
        Self {
            files_copied: 0,
            files_skipped: 0,
            bytes_copied: 0,
            errors: Vec::new(),
            cancelled: false,
            started_at: Local::now(),
            duration: Duration::ZERO,
        }
    }

    /// Count one written file
    pub fn record_copied(&mut self, bytes: u64) {
        self.files_copied += 1;
        self.bytes_copied += bytes;
    }

    /// Count one kept destination
    pub fn record_skipped(&mut self) {
        self.files_skipped += 1;
    }

    /// Add one path-scoped error
    pub fn record_failure(&mut self, path: &Path, message: impl Into<String>) {
        self.errors.push(CopyFailure::new(path, message));
    }

    /// Number of collected errors
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Check if the copy was completely successful
    pub fn is_success(&self) -> bool {
        self.errors.is_empty() && !self.cancelled
    }

    /// Average throughput in bytes/second
    pub fn throughput(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.bytes_copied as f64 / secs
        } else {
            0.0
        }
    }

    /// Print summary to console
    pub fn print_summary(&self) {
        if self.cancelled {
            println!("\n=== Copy Cancelled ===");
        } else {
            println!("\n=== Copy Summary ===");
        }
        println!("Started:         {}", self.started_at.format("%Y-%m-%d %H:%M:%S"));
        println!("Files copied:    {}", self.files_copied);
        println!("Files skipped:   {}", self.files_skipped);
        println!("Bytes copied:    {}", humansize::format_size(self.bytes_copied, humansize::BINARY));
        println!(
            "Duration:        {}",
            humantime::format_duration(Duration::from_millis(self.duration.as_millis() as u64))
        );
        println!("Throughput:      {}/s", humansize::format_size(self.throughput() as u64, humansize::BINARY));

        if !self.errors.is_empty() {
            println!("\nFailures: {}", self.errors.len());
            for failure in &self.errors {
                println!("  {} - {}", failure.path.display(), failure.message);
            }
        }
    }

    /// JSON rendering for `--output-format json`
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
