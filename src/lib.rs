//! Multi-target release pipeline for the foobar payload.
//!
//! - [`bundler`] packages the payload per platform target and maintains the
//!   `checksums.txt` manifest
//! - [`publish`] creates GitHub and GitLab releases from the distribution directory
//! - [`cli`] resolves arguments, sequences commands and publishes the image
//! - [`installer`] downloads, verifies and installs a published release
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod bundler;
pub mod cli;
pub mod error;
pub mod installer;
pub mod process;
pub mod publish;

// Re-export commonly used types
pub use error::{CliError, ReleaseError, Result};
