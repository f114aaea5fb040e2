//! Error types for dirpaths
//!
//! This module defines the error hierarchy for a walk:
//! - Root errors (missing or unlistable roots, fatal before traversal)
//! - Configuration errors (rejected before any traversal starts)
//! - Worker thread errors (parallel walker)
//!
//! Per-directory listing failures below a root are not errors: they are
//! recorded as [`WalkWarning`]s so the walk can always run to completion.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for walks
#[derive(Error, Debug)]
pub enum WalkerError {
    /// A configured root does not exist or is not a directory
    #[error("Root directory not found: '{}'", path.display())]
    RootNotFound { path: PathBuf },

    /// A configured root exists but cannot be listed
    #[error("Root directory '{}' is not readable: {source}", path.display())]
    RootNotReadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Worker/concurrency errors
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    /// I/O errors outside of traversal (output, tree building)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration errors, raised before any traversal starts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No root directory supplied
    #[error("At least one root directory is required")]
    NoRoots,

    /// Minimum level above maximum level
    #[error("Invalid level range: min level {min} is greater than max level {max}")]
    InvalidLevelRange { min: usize, max: usize },

    /// Maximum level of zero can never match (the shallowest level is 1)
    #[error("Invalid max level 0: levels start at 1")]
    InvalidMaxLevel,

    /// Folder collapsing only happens at the max level
    #[error("Non-empty folder collapsing requires a max level")]
    NonEmptyFoldersWithoutMaxLevel,

    /// Invalid worker count
    #[error("Invalid worker count {count}: must be between 1 and {max}")]
    InvalidWorkerCount { count: usize, max: usize },

    /// Both only-files and only-folders requested
    #[error("Only one of files-only or folders-only may be selected")]
    ConflictingSelection,

    /// Malformed `LEVEL=A,B` level filter argument
    #[error("Invalid level filter '{arg}': {reason}")]
    InvalidLevelFilter { arg: String, reason: String },
}

/// Worker thread errors
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Worker panicked
    #[error("Worker {id} panicked")]
    Panicked { id: usize },

    /// Worker thread could not be spawned
    #[error("Failed to spawn worker {id}: {reason}")]
    SpawnFailed { id: usize, reason: String },
}

/// A directory below a root that could not be expanded.
///
/// The walk treats it as having no children and carries on.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct WalkWarning {
    /// Path of the directory that failed
    pub path: PathBuf,

    /// Human readable cause
    pub reason: String,
}

impl WalkWarning {
    pub fn new(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

impl std::fmt::Display for WalkWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.reason)
    }
}

/// Result type alias for WalkerError
pub type Result<T> = std::result::Result<T, WalkerError>;

/// Represents the outcome of expanding a single directory
#[derive(Debug)]
pub enum WalkOutcome {
    /// Directory listed successfully
    Expanded {
        path: PathBuf,
        emitted: usize,
        subdirs: usize,
    },

    /// Directory could not be listed; treated as empty
    Failed { path: PathBuf, error: std::io::Error },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_conversion() {
        let err: WalkerError = ConfigError::InvalidLevelRange { min: 3, max: 2 }.into();
        assert!(matches!(err, WalkerError::Config(_)));
        assert_eq!(
            err.to_string(),
            "Configuration error: Invalid level range: min level 3 is greater than max level 2"
        );
    }

    #[test]
    fn test_root_not_readable_keeps_source() {
        use std::error::Error as _;

        let err = WalkerError::RootNotReadable {
            path: PathBuf::from("/data"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().starts_with("Root directory '/data' is not readable"));
    }
}
