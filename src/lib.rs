//! # mclub - consolidate files from many places into one folder
//!
//! mclub takes a selection of files and folders, works out where every file
//! will land under a single destination folder, checks that the destination
//! volume can hold what will actually be written, and then copies file by
//! file on a background worker that reports progress through events.
//!
//! ## Features
//!
//! - **Flattening**: drop a number of leading path segments from each source
//! - **Overwrite rules**: never, when newer, when larger, or either
//! - **Collision handling**: numbered names or abort when flattening merges files
//! - **Space check first**: nothing is written if the plan does not fit
//! - **Cancellable worker**: stop between files, keep what was copied
//!
//! ## Quick Start
//!
//! ```no_run
//! use mclub::config::{CopyConfig, OverwriteMode};
//! use mclub::core::CopyEngine;
//! use std::path::PathBuf;
//!
//! let config = CopyConfig {
//!     sources: vec![PathBuf::from("/music/rock"), PathBuf::from("/music/jazz")],
//!     destination: PathBuf::from("/mnt/usb/music"),
//!     flatten_depth: 2,
//!     overwrite: OverwriteMode::Newer,
//!     ..Default::default()
//! };
//!
//! let summary = CopyEngine::new(config).execute().unwrap();
//! summary.print_summary();
//! ```
//!
//! ## Observing a background run
//!
//! ```no_run
//! use mclub::config::CopyConfig;
//! use mclub::core::{CopyEngine, Session};
//!
//! let handle = CopyEngine::new(CopyConfig::default()).spawn();
//! let mut session = Session::new();
//! session.begin().unwrap();
//!
//! for event in handle.events().iter() {
//!     session.apply(event).unwrap();
//! }
//! println!("{}", session.state());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod core;
pub mod error;
pub mod fs;
pub mod progress;

// Re-export commonly used types
pub use config::{CopyConfig, CopyPolicy, OverwriteMode};
pub use core::{CopyEngine, CopyEvent, CopyPlan, RunSummary, Session};
pub use error::{MclubError, Result};
pub use progress::ProgressReporter;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    //! Convenient re-exports for common usage
    //!
    //! ```no_run
    //! use mclub::prelude::*;
    //! ```

    pub use crate::config::{CollisionPolicy, CopyConfig, CopyPolicy, OverwriteMode};
    pub use crate::core::{
        plan_copy, CopyEngine, CopyEvent, CopyHandle, CopyPlan, CopyTask, OverwriteDecision, RunSummary, Session,
        SessionState,
    };
    pub use crate::error::{MclubError, Result};
    pub use crate::fs::{enumerate_sources, FileEntry, SourceListing, SpaceProbe, SystemSpaceProbe};
    pub use crate::progress::ProgressReporter;
}
