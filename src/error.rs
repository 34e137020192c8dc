//! Error types for mclub
//!
//! Only a handful of failures stop a run outright (bad configuration, a
//! destination that cannot hold the planned data, an unresolvable flatten
//! collision). Everything that happens to a single file is recorded in the
//! run summary instead and never surfaces as an `Err`.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for mclub operations
#[derive(Error, Debug)]
pub enum MclubError {
    /// I/O error during file operations
    #[error("I/O error at '{path}': {source}")]
    Io {
        /// Path being read or written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// File or directory not found
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Destination volume cannot hold the planned data
    #[error("Insufficient disk space at '{path}': need {required} bytes, have {available} bytes")]
    InsufficientSpace {
        /// Destination root
        path: PathBuf,
        /// Bytes the plan writes
        required: u64,
        /// Bytes free on the volume
        available: u64,
    },

    /// Two sources flatten onto the same destination path
    #[error("'{first}' and '{second}' both map to '{destination}'")]
    DestinationCollision {
        /// Contested destination path
        destination: PathBuf,
        /// Source already holding it
        first: PathBuf,
        /// Source that lost
        second: PathBuf,
    },

    /// Session received an event that does not fit its current state
    #[error("Cannot apply '{event}' while {state}")]
    InvalidTransition {
        /// State name at the time
        state: String,
        /// Rejected event name
        event: String,
    },

    /// Copy worker hung up before reporting a result
    #[error("Copy worker disconnected unexpectedly")]
    WorkerDisconnected,
}

impl MclubError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }
}

/// Result type alias for mclub operations
pub type Result<T> = std::result::Result<T, MclubError>;

impl From<std::io::Error> for MclubError {
    fn from(err: std::io::Error) -> Self {
        MclubError::Io {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for MclubError {
    fn from(err: serde_json::Error) -> Self {
        MclubError::ConfigError(format!("cannot encode summary: {err}"))
    }
}

/// Extension trait for adding path context to std::io::Result
pub trait IoResultExt<T> {
    /// Add path context to an I/O error
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| MclubError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_with_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = MclubError::io("/test/path", io_err);
        assert!(err.to_string().contains("/test/path"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_space_message_names_both_sides() {
        let err = MclubError::InsufficientSpace {
            path: PathBuf::from("/dst"),
            required: 60,
            available: 15,
        };
        let text = err.to_string();
        assert!(text.contains("need 60 bytes"));
        assert!(text.contains("have 15 bytes"));
    }

    #[test]
    fn test_with_path_extension() {
        let res: std::io::Result<()> =
            Err(std::io::Error::new(std::io::ErrorKind::Other, "boom"));
        match res.with_path("/some/file") {
            Err(MclubError::Io { path, .. }) => assert_eq!(path, PathBuf::from("/some/file")),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_json_error_becomes_config_error() {
        let err: MclubError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, MclubError::ConfigError(_)));
    }
}
