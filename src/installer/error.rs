//! Installer errors.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for installer operations
pub type Result<T> = std::result::Result<T, InstallError>;

/// Everything that can stop an install.
#[derive(Debug, Error)]
pub enum InstallError {
    /// Request failed or returned an error status
    #[error("download failed for {url}: {reason}")]
    Download {
        /// Requested URL
        url: String,
        /// What went wrong
        reason: String,
    },

    /// Server answered 404
    #[error("not found: {url}")]
    NotFound {
        /// Requested URL
        url: String,
    },

    /// The release does not provide the file this host needs
    #[error("release {tag} has no asset named {name}")]
    AssetMissing {
        /// Release tag
        tag: String,
        /// Expected asset name
        name: String,
    },

    /// Archive could not be read or does not hold exactly one file
    #[error("invalid archive {name}: {reason}")]
    Archive {
        /// Archive file name
        name: String,
        /// What is wrong with it
        reason: String,
    },

    /// No supported platform target for this machine
    #[error("unsupported host platform {os}/{arch}")]
    UnsupportedHost {
        /// `std::env::consts::OS`
        os: &'static str,
        /// `std::env::consts::ARCH`
        arch: &'static str,
    },

    /// None of the candidate directories accepts writes
    #[error("no writable install directory among: {}", display_paths(tried))]
    NoWritableDir {
        /// Directories tried, in order
        tried: Vec<PathBuf>,
    },

    /// Malformed `--repo` or host URL
    #[error("invalid release location: {0}")]
    Location(String),

    /// Checksum, manifest and filesystem errors
    #[error(transparent)]
    Bundler(#[from] crate::bundler::Error),

    /// JSON decoding errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
