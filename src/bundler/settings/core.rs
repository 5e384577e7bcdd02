//! Core Settings struct and implementations.

use super::{PlatformTarget, Version};
use std::path::{Path, PathBuf};

/// Name of the checksum manifest written into the distribution directory.
pub const MANIFEST_FILE_NAME: &str = "checksums.txt";

/// Settings for a packaging run.
///
/// Constructed via [`SettingsBuilder`](super::SettingsBuilder), which validates
/// that the payload exists and the target list is non-empty.
#[derive(Clone, Debug)]
pub struct Settings {
    /// Payload copied verbatim into every artifact.
    source: PathBuf,

    /// Artifact base name, e.g. `foobar`.
    name: String,

    /// Release version embedded in artifact names.
    version: Version,

    /// Output directory for artifacts and the manifest.
    dist_dir: PathBuf,

    /// Targets to package, in processing order.
    targets: Vec<PlatformTarget>,

    /// Archive each artifact and drop the raw copy.
    compress: bool,
}

impl Settings {
    pub(super) fn new(
        source: PathBuf,
        name: String,
        version: Version,
        dist_dir: PathBuf,
        targets: Vec<PlatformTarget>,
        compress: bool,
    ) -> Self {
        Self {
            source,
            name,
            version,
            dist_dir,
            targets,
            compress,
        }
    }

    /// Payload path.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Artifact base name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Release version.
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Distribution directory.
    pub fn dist_dir(&self) -> &Path {
        &self.dist_dir
    }

    /// Targets in processing order.
    pub fn targets(&self) -> &[PlatformTarget] {
        &self.targets
    }

    /// Whether compression was requested.
    pub fn compress(&self) -> bool {
        self.compress
    }

    /// Path of the checksum manifest.
    pub fn manifest_path(&self) -> PathBuf {
        self.dist_dir.join(MANIFEST_FILE_NAME)
    }

    /// Raw artifact file name: `<name>_<version>_<os>_<arch>[.exe]`.
    pub fn artifact_file_name(&self, target: &PlatformTarget) -> String {
        artifact_file_name(&self.name, &self.version, target)
    }

    /// Final artifact file name, including the archive extension if compressing.
    pub fn final_file_name(&self, target: &PlatformTarget) -> String {
        let raw = self.artifact_file_name(target);
        if self.compress {
            format!("{raw}{}", target.archive_format().extension())
        } else {
            raw
        }
    }
}

/// `<name>_<version>_<os>_<arch>[.exe]`, the raw artifact name for `target`.
pub fn artifact_file_name(name: &str, version: &Version, target: &PlatformTarget) -> String {
    format!("{name}_{version}_{target}{}", target.exe_suffix())
}

/// Published archive name for `target`: the raw name plus `.zip` or `.tar.gz`.
pub fn archive_file_name(name: &str, version: &Version, target: &PlatformTarget) -> String {
    format!(
        "{}{}",
        artifact_file_name(name, version, target),
        target.archive_format().extension()
    )
}
