//! Multi-target artifact packaging.
//!
//! This module turns one opaque payload into a release artifact set:
//! one file per [`PlatformTarget`], optionally archived (`.zip` for Windows,
//! `.tar.gz` elsewhere), each recorded in a `checksums.txt` manifest.
//!
//! ```no_run
//! use foobar_release::bundler::{ArtifactPackager, SettingsBuilder};
//!
//! # async fn example() -> foobar_release::bundler::Result<()> {
//! let settings = SettingsBuilder::new()
//!     .source("foobar.sh")
//!     .version("v1.2.3".parse()?)
//!     .dist_dir("dist")
//!     .targets(vec!["linux_amd64".parse()?, "windows_amd64".parse()?])
//!     .compress(true)
//!     .build()?;
//! // dist/foobar_v1.2.3_linux_amd64.tar.gz
//! // dist/foobar_v1.2.3_windows_amd64.exe.zip
//! // dist/checksums.txt
//! ArtifactPackager::new(settings).package().await?;
//! # Ok(())
//! # }
//! ```

mod builder;
pub mod error;
mod settings;
pub mod utils;

pub use builder::{
    ArtifactPackager, ChecksumWriter, ManifestEntry, archive_artifact, calculate_sha256,
    parse_manifest, sha256_hex, tool_detection,
};
pub use error::{Error, Result};
pub use settings::{
    Arch, ArchiveFormat, MANIFEST_FILE_NAME, Os, PlatformTarget, Settings, SettingsBuilder,
    Version, archive_file_name, artifact_file_name, parse_target_list,
};

/// Lifecycle of an artifact within one build.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ArtifactState {
    /// Payload copied under its target name.
    Raw,
    /// Packed into its platform archive; the raw copy is gone.
    Archived,
    /// Final form hashed and listed in the manifest.
    Checksummed,
}

/// A produced release file.
///
/// Belongs to exactly one [`PlatformTarget`] and one [`Version`].
#[derive(Debug, Clone)]
pub struct Artifact {
    /// Target this artifact was built for.
    pub target: PlatformTarget,

    /// Release version embedded in the file name.
    pub version: Version,

    /// Current location on disk.
    pub path: std::path::PathBuf,

    /// Where in the raw → archived → checksummed lifecycle the artifact is.
    pub state: ArtifactState,

    /// Size in bytes of the final file.
    pub size: u64,

    /// SHA-256 recorded in the manifest, once checksummed.
    pub checksum: Option<String>,
}
