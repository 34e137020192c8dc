//! Messages between the copy worker and its observer.
//!
//! Events flow worker → observer only; commands flow observer → worker.
//! No counters are shared between the two sides.

use crate::core::RunSummary;
use std::path::PathBuf;

/// Reported by the worker as the run advances
#[derive(Debug, Clone)]
pub enum CopyEvent {
    /// Plan accepted (space check passed); copying starts
    Planned {
        /// Tasks in the plan, skipped ones included
        files_total: usize,
        /// Bytes that will be written
        bytes_total: u64,
        /// Tasks whose destination will be kept
        skipped: usize,
    },
    /// One task finished (copied, skipped or failed)
    Progress {
        /// Source of the task just handled
        current_file: PathBuf,
        /// Bytes written so far
        bytes_done: u64,
        /// Bytes the plan will write
        bytes_total: u64,
        /// Tasks handled so far
        files_done: usize,
        /// Tasks in the plan
        files_total: usize,
    },
    /// Destination cannot hold the plan; nothing was written
    SpaceCheckFailed {
        /// Bytes the plan needs
        required: u64,
        /// Bytes free on the destination volume
        available: u64,
    },
    /// Run over, with or without per-file errors
    Finished(RunSummary),
    /// Run could not start (bad selection, collision, probe failure)
    Failed(String),
}

impl CopyEvent {
    /// Short name for diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            Self::Planned { .. } => "planned",
            Self::Progress { .. } => "progress",
            Self::SpaceCheckFailed { .. } => "space-check-failed",
            Self::Finished(_) => "finished",
            Self::Failed(_) => "failed",
        }
    }
}

/// Sent by the observer to the worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerCommand {
    /// Stop after the file currently being copied
    Cancel,
}
