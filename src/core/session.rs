//! Observer-side run state
//!
//! A [`Session`] is driven only by [`CopyEvent`]s coming from the worker.
//! Whatever front end sits on top asks it whether a new run may start and
//! what to show; it never touches worker state directly.

use crate::core::{CopyEvent, RunSummary};
use crate::error::{MclubError, Result};
use std::fmt;
use std::path::PathBuf;

/// Where a run currently is
#[derive(Debug, Clone, Default)]
pub enum SessionState {
    /// Nothing running; ready for a selection
    #[default]
    Idle,
    /// Enumerating, planning and checking space
    Planning,
    /// Destination too small; nothing was written
    CopySpaceCheckFailed {
        /// Bytes the plan needs
        required: u64,
        /// Bytes free on the destination volume
        available: u64,
    },
    /// Worker is copying
    Copying {
        /// Tasks in the plan
        files_total: usize,
        /// Bytes the plan will write
        bytes_total: u64,
        /// Tasks handled so far
        files_done: usize,
        /// Bytes written so far
        bytes_done: u64,
        /// Last file reported
        current_file: Option<PathBuf>,
    },
    /// Run over
    Done(RunSummary),
}

impl SessionState {
    /// Short name for diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Planning => "planning",
            Self::CopySpaceCheckFailed { .. } => "space-check-failed",
            Self::Copying { .. } => "copying",
            Self::Done(_) => "done",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// State of one copy session, across runs
#[derive(Debug, Default)]
pub struct Session {
    state: SessionState,
    last_error: Option<String>,
}

impl Session {
    /// Idle session
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Message of the last run that could not start
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// A new run may be started from here
    pub fn can_start(&self) -> bool {
        matches!(
            self.state,
            SessionState::Idle | SessionState::CopySpaceCheckFailed { .. } | SessionState::Done(_)
        )
    }

    /// A run is in flight
    pub fn is_busy(&self) -> bool {
        !self.can_start()
    }

    /// Start a run: move to `Planning`.
    pub fn begin(&mut self) -> Result<()> {
        if !self.can_start() {
            return Err(MclubError::InvalidTransition {
                state: self.state.name().to_string(),
                event: "begin".to_string(),
            });
        }
        self.last_error = None;
        self.state = SessionState::Planning;
        Ok(())
    }

    /// Feed one worker event.
    ///
    /// An event that makes no sense in the current state is rejected and
    /// the state is left as it was.
    pub fn apply(&mut self, event: CopyEvent) -> Result<()> {
        let event_name = event.name();

        let next = match (&mut self.state, event) {
            (
                SessionState::Planning,
                CopyEvent::Planned {
                    files_total,
                    bytes_total,
                    ..
                },
            ) => SessionState::Copying {
                files_total,
                bytes_total,
                files_done: 0,
                bytes_done: 0,
                current_file: None,
            },
            (SessionState::Planning, CopyEvent::SpaceCheckFailed { required, available }) => {
                SessionState::CopySpaceCheckFailed { required, available }
            }
            (SessionState::Planning | SessionState::Copying { .. }, CopyEvent::Failed(message)) => {
                tracing::debug!("Run failed: {}", message);
                self.last_error = Some(message);
                SessionState::Idle
            }
            (
                SessionState::Copying {
                    files_done,
                    bytes_done,
                    current_file,
                    ..
                },
                CopyEvent::Progress {
                    current_file: file,
                    bytes_done: bytes,
                    files_done: files,
                    ..
                },
            ) => {
                *files_done = files;
                *bytes_done = bytes;
                *current_file = Some(file);
                return Ok(());
            }
            (SessionState::Copying { .. }, CopyEvent::Finished(summary)) => SessionState::Done(summary),
            (state, _) => {
                return Err(MclubError::InvalidTransition {
                    state: state.name().to_string(),
                    event: event_name.to_string(),
                })
            }
        };

        tracing::trace!("Session {} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }
}
