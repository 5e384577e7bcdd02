//! Error types for pipeline operations.
//!
//! Packaging-level failures live in [`crate::bundler::Error`]; this module adds
//! the CLI, publishing and registry kinds on top.

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, ReleaseError>;

/// Main error type for all pipeline operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Packaging, validation and tool-detection errors
    #[error(transparent)]
    Bundler(#[from] crate::bundler::Error),

    /// A release for this version already exists on the provider
    #[error("release exists: {provider} already has a release tagged {version}")]
    ReleaseExists {
        /// Provider name
        provider: String,
        /// Release tag
        version: String,
    },

    /// Publishing to one provider failed
    #[error("{provider} publish failed: {reason}")]
    Publish {
        /// Provider name
        provider: String,
        /// What went wrong
        reason: String,
    },

    /// Publish retries ran out
    #[error("{provider} publish failed after {attempts} attempt(s): {last}")]
    RetriesExhausted {
        /// Provider name
        provider: String,
        /// Attempts made
        attempts: u32,
        /// Error of the final attempt
        last: String,
    },

    /// A pushed tag cannot be resolved in the registry
    #[error("registry integrity check failed: {tag} is not resolvable after push")]
    RegistryIntegrity {
        /// Image reference that failed to resolve
        tag: String,
    },

    /// One or more release providers failed
    #[error("release failed for: {}", failed.join(", "))]
    ProvidersFailed {
        /// Names of the failed providers
        failed: Vec<String>,
    },

    /// A bounded poll loop ran out of time
    #[error("timed out after {seconds}s waiting for {what}")]
    Timeout {
        /// What was being waited for
        what: String,
        /// Budget in seconds
        seconds: u64,
    },
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Missing required argument
    #[error("Missing required argument: {argument}")]
    MissingArgument {
        /// Argument name
        argument: String,
    },

    /// Command execution failed
    #[error("Command execution failed: {command} - {reason}")]
    ExecutionFailed {
        /// Command that failed
        command: String,
        /// Reason for the error
        reason: String,
    },
}

impl ReleaseError {
    /// Whether this error happened before any side effect was performed.
    pub fn is_preflight(&self) -> bool {
        matches!(
            self,
            ReleaseError::Cli(CliError::MissingArgument { .. })
                | ReleaseError::Bundler(
                    crate::bundler::Error::Validation(_) | crate::bundler::Error::ToolMissing { .. }
                )
        )
    }

    /// Process exit code for this error.
    ///
    /// Pre-flight failures exit with 2, everything else with 1.
    pub fn exit_code(&self) -> i32 {
        if self.is_preflight() { 2 } else { 1 }
    }
}
