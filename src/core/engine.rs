//! Copy orchestration
//!
//! enumerate → plan → space check → execute, either inline
//! ([`CopyEngine::execute`]) or on a background worker thread
//! ([`CopyEngine::spawn`]) that reports through [`CopyEvent`]s.

use crate::config::CopyConfig;
use crate::core::{plan_copy, CopyEvent, CopyExecutor, CopyPlan, RunSummary, WorkerCommand};
use crate::error::{MclubError, Result};
use crate::fs::{check_space, enumerate_sources, CopyOptions, SourceListing, SpaceProbe, SystemSpaceProbe};
use crossbeam::channel::{unbounded, Receiver, Sender};
use std::thread;
use std::time::Instant;

/// Main copy engine
pub struct CopyEngine {
    /// Configuration
    config: CopyConfig,
    /// Copy primitive options
    options: CopyOptions,
    /// Destination free-space source
    probe: Box<dyn SpaceProbe>,
}

impl CopyEngine {
    /// Create a new copy engine
    pub fn new(config: CopyConfig) -> Self {
        let options = CopyOptions {
            preserve_permissions: config.preserve,
            preserve_mtime: config.preserve,
            ..Default::default()
        };

        Self {
            config,
            options,
            probe: Box::new(SystemSpaceProbe),
        }
    }

    /// Replace the free-space probe
    pub fn with_space_probe(mut self, probe: impl SpaceProbe + 'static) -> Self {
        self.probe = Box::new(probe);
        self
    }

    /// Enumerate the sources and build the plan, touching nothing.
    pub fn plan(&self) -> Result<(SourceListing, CopyPlan)> {
        let listing = enumerate_sources(&self.config.sources)?;
        let plan = plan_copy(&listing, &self.config.destination, &self.config.policy())?;
        Ok((listing, plan))
    }

    /// Run inline without an observer
    pub fn execute(&self) -> Result<RunSummary> {
        let (events, _ignored) = unbounded();
        let (_keep, commands) = unbounded();
        self.execute_with(&events, &commands)
    }

    /// Run inline, reporting through `events` and polling `commands`.
    ///
    /// Returns `Err` only when the run could not start; in particular
    /// [`MclubError::InsufficientSpace`] is returned before any file is
    /// written.
    pub fn execute_with(
        &self,
        events: &Sender<CopyEvent>,
        commands: &Receiver<WorkerCommand>,
    ) -> Result<RunSummary> {
        let start = Instant::now();
        let mut summary = RunSummary::new();

        let (listing, plan) = self.plan()?;
        summary.errors.extend(listing.errors);

        let required = plan.required_bytes();
        let available = check_space(self.probe.as_ref(), &plan.destination_root, required)?;
        tracing::info!(
            "Copying {} files ({} bytes, {} kept) into {} with {} bytes free",
            plan.write_count(),
            required,
            plan.skip_count(),
            plan.destination_root.display(),
            available
        );

        let _ = events.send(CopyEvent::Planned {
            files_total: plan.tasks.len(),
            bytes_total: required,
            skipped: plan.skip_count(),
        });

        let executor = CopyExecutor::new(self.options.clone());
        let mut summary = executor.run(plan, summary, events, commands);
        summary.duration = start.elapsed();
        Ok(summary)
    }

    /// Move the engine onto a background thread.
    pub fn spawn(self) -> CopyHandle {
        self.spawn_on(unbounded())
    }

    fn spawn_on(self, (event_tx, event_rx): (Sender<CopyEvent>, Receiver<CopyEvent>)) -> CopyHandle {
        let (command_tx, command_rx) = unbounded();

        let join = thread::spawn(move || {
            let result = self.execute_with(&event_tx, &command_rx);

            let terminal = match &result {
                Ok(summary) => CopyEvent::Finished(summary.clone()),
                Err(MclubError::InsufficientSpace {
                    required, available, ..
                }) => CopyEvent::SpaceCheckFailed {
                    required: *required,
                    available: *available,
                },
                Err(e) => CopyEvent::Failed(e.to_string()),
            };
            let _ = event_tx.send(terminal);

            tracing::debug!("Copy worker shutting down");
            result
        });

        CopyHandle {
            events: event_rx,
            commands: command_tx,
            join,
        }
    }
}

/// Observer side of a background copy
pub struct CopyHandle {
    events: Receiver<CopyEvent>,
    commands: Sender<WorkerCommand>,
    join: thread::JoinHandle<Result<RunSummary>>,
}

impl CopyHandle {
    /// Event stream; ends after the terminal event
    pub fn events(&self) -> &Receiver<CopyEvent> {
        &self.events
    }

    /// Ask the worker to stop after the current file
    pub fn cancel(&self) {
        self.canceller().cancel();
    }

    /// Detached cancel trigger, e.g. for a signal handler
    pub fn canceller(&self) -> Canceller {
        Canceller {
            commands: self.commands.clone(),
        }
    }

    /// Wait for the worker and take its result
    pub fn join(self) -> Result<RunSummary> {
        self.join.join().map_err(|_| MclubError::WorkerDisconnected)?
    }
}

/// Sends [`WorkerCommand::Cancel`] from anywhere
#[derive(Debug, Clone)]
pub struct Canceller {
    commands: Sender<WorkerCommand>,
}

impl Canceller {
    /// Ask the worker to stop after the current file
    pub fn cancel(&self) {
        let _ = self.commands.send(WorkerCommand::Cancel);
    }
}
