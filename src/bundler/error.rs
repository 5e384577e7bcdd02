//! Error types for packaging operations.
//!
//! Per-target failures are collected by the packager and surfaced as a single
//! [`Error::PackagingFailed`] once every target has been attempted.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for packaging operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while validating inputs and building artifacts.
#[derive(Error, Debug)]
pub enum Error {
    /// Input failed pre-flight validation. Nothing has been written yet.
    #[error("validation error: {0}")]
    Validation(String),

    /// A required external tool is not on PATH.
    #[error("required tool not found: {tool}")]
    ToolMissing {
        /// Tool name as looked up on PATH
        tool: String,
    },

    /// One platform target failed; the batch carries on.
    #[error("target {target} failed: {reason}")]
    PerTarget {
        /// Target identifier, e.g. `linux_amd64`
        target: String,
        /// What went wrong
        reason: String,
    },

    /// At least one target failed after the whole batch was attempted.
    #[error("{failed} of {total} platform target(s) failed to package")]
    PackagingFailed {
        /// Number of failed targets
        failed: usize,
        /// Number of attempted targets
        total: usize,
    },

    /// Manifest entry does not match the file on disk.
    #[error("checksum mismatch for {file}: manifest {expected}, actual {actual}")]
    ChecksumMismatch {
        /// Artifact filename
        file: String,
        /// Hash recorded in the manifest
        expected: String,
        /// Hash recomputed from disk
        actual: String,
    },

    /// IO error with the path and action that triggered it.
    #[error("{action} {}: {source}", path.display())]
    Fs {
        /// What was being done
        action: String,
        /// Path involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Bare IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Zip archive error.
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Free-form failure.
    #[error("{0}")]
    GenericError(String),
}

/// Attach filesystem context to IO results.
pub trait ErrorExt<T> {
    /// Wrap an IO error with the action being performed and the path involved.
    fn fs_context(self, action: &str, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, action: &str, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|source| Error::Fs {
            action: action.to_string(),
            path: path.as_ref().to_path_buf(),
            source,
        })
    }
}

/// Return early with an [`Error::GenericError`].
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::bundler::Error::GenericError(format!($($arg)*)))
    };
}
