//! Sequential copy executor
//!
//! Works through a [`CopyPlan`] one task at a time. A failing file is
//! recorded and the run moves on; only a cancel command stops it early.

use crate::core::{CopyEvent, CopyPlan, RunSummary, WorkerCommand};
use crate::fs::{CopyOptions, FileCopier};
use crossbeam::channel::{Receiver, Sender};
use std::time::Instant;

/// Executes a plan, reporting after every task
pub struct CopyExecutor {
    copier: FileCopier,
}

impl CopyExecutor {
    /// Create an executor with the given copy options
    pub fn new(options: CopyOptions) -> Self {
        Self {
            copier: FileCopier::new(options),
        }
    }

    /// Run every task of `plan`, folding results into `summary`.
    ///
    /// `commands` is polled between files. A closed command channel is
    /// treated as "no more commands", not as a cancel.
    pub fn run(
        &self,
        plan: CopyPlan,
        mut summary: RunSummary,
        events: &Sender<CopyEvent>,
        commands: &Receiver<WorkerCommand>,
    ) -> RunSummary {
        let start = Instant::now();
        let files_total = plan.tasks.len();
        let bytes_total = plan.required_bytes();

        for (index, task) in plan.tasks.into_iter().enumerate() {
            if let Ok(WorkerCommand::Cancel) = commands.try_recv() {
                tracing::info!("Copy cancelled after {} of {} files", index, files_total);
                summary.cancelled = true;
                break;
            }

            if task.overwrite_decision.writes() {
                match self.copier.copy(&task.source, &task.destination) {
                    Ok(stats) => {
                        tracing::debug!(
                            "Copied {} -> {} ({} bytes)",
                            task.source.display(),
                            task.destination.display(),
                            stats.bytes_copied
                        );
                        summary.record_copied(stats.bytes_copied);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to copy {}: {}", task.source.display(), e);
                        summary.record_failure(&task.source, e.to_string());
                    }
                }
            } else {
                tracing::debug!("Kept existing {}", task.destination.display());
                summary.record_skipped();
            }

            let _ = events.send(CopyEvent::Progress {
                current_file: task.source,
                bytes_done: summary.bytes_copied,
                bytes_total,
                files_done: index + 1,
                files_total,
            });
        }

        summary.duration += start.elapsed();
        summary
    }
}
