//! Configuration module for mclub
//!
//! Provides the CLI arguments, the per-run copy policy and the runtime
//! configuration built from them.

mod settings;

pub use settings::*;
