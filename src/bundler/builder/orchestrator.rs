//! Per-platform artifact packaging.
//!
//! This module provides the [`ArtifactPackager`] that turns one payload into
//! a named artifact per [`PlatformTarget`], optionally archives it, and
//! records it in the checksum manifest.

use crate::bundler::{
    Artifact, ArtifactState, Error, PlatformTarget, Result, Settings, error::ErrorExt,
    utils::fs::{make_executable, remove_file_if_exists},
};

use super::{archive::archive_artifact, checksum::ChecksumWriter};
use std::path::Path;

/// Packages one payload for a set of platform targets.
///
/// Targets are processed one at a time, ordered by final file name.
/// A failure on one target is logged and counted, and the batch carries on;
/// the run fails only after every target has been attempted.
///
/// # Examples
///
/// ```no_run
/// use foobar_release::bundler::{ArtifactPackager, SettingsBuilder};
///
/// # async fn example() -> foobar_release::bundler::Result<()> {
/// let settings = SettingsBuilder::new()
///     .source("foobar.sh")
///     .version("v1.2.3".parse()?)
///     .dist_dir("dist")
///     .compress(true)
///     .build()?;
///
/// let artifacts = ArtifactPackager::new(settings).package().await?;
/// for artifact in artifacts {
///     println!("{} {}", artifact.checksum.unwrap_or_default(), artifact.path.display());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ArtifactPackager {
    settings: Settings,
    checksums: ChecksumWriter,
}

impl ArtifactPackager {
    /// Creates a packager for the given settings.
    pub fn new(settings: Settings) -> Self {
        let checksums = ChecksumWriter::new(settings.dist_dir());
        Self {
            settings,
            checksums,
        }
    }

    /// Returns a reference to the packaging settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Builds every target and returns the finished artifacts.
    ///
    /// Creates the distribution directory if needed and truncates any existing
    /// manifest before the first target. Targets are built in final file name
    /// order so manifest lines come out sorted. Unrelated files already present in
    /// the directory are left alone.
    ///
    /// # Errors
    ///
    /// Setup failures (directory creation, manifest truncation) abort at once.
    /// Per-target failures are collected and reported as
    /// [`Error::PackagingFailed`] after all targets were attempted.
    pub async fn package(&self) -> Result<Vec<Artifact>> {
        let dist_dir = self.settings.dist_dir();
        tokio::fs::create_dir_all(dist_dir)
            .await
            .fs_context("creating distribution directory", dist_dir)?;
        self.checksums.truncate().await?;

        let total = self.settings.targets().len();
        let mut artifacts = Vec::with_capacity(total);
        let mut failed = 0usize;

        let mut ordered: Vec<&PlatformTarget> = self.settings.targets().iter().collect();
        ordered.sort_by_cached_key(|t| self.settings.final_file_name(t));

        for target in ordered {
            match self.package_target(target).await {
                Ok(artifact) => {
                    log::info!("✓ {} → {}", target, artifact.path.display());
                    artifacts.push(artifact);
                }
                Err(e) => {
                    failed += 1;
                    log::error!("✗ Packaging failed for {target}: {e}");
                }
            }
        }

        if failed > 0 {
            return Err(Error::PackagingFailed { failed, total });
        }

        log::info!(
            "Packaged {} artifact(s) for {} into {}",
            artifacts.len(),
            self.settings.version(),
            dist_dir.display()
        );
        Ok(artifacts)
    }

    /// Produces, optionally archives, and checksums a single target.
    ///
    /// On failure both the raw copy and the archive are removed, so the
    /// directory never holds a file for this target that the manifest does
    /// not list.
    async fn package_target(&self, target: &PlatformTarget) -> Result<Artifact> {
        let dist_dir = self.settings.dist_dir();
        let raw_path = dist_dir.join(self.settings.artifact_file_name(target));
        let final_path = dist_dir.join(self.settings.final_file_name(target));

        match self.produce(target, &raw_path).await {
            Ok(artifact) => Ok(artifact),
            Err(e) => {
                for leftover in [&raw_path, &final_path] {
                    if let Err(cleanup) = remove_file_if_exists(leftover).await {
                        log::warn!("Could not remove {}: {cleanup}", leftover.display());
                    }
                }
                Err(per_target(target, e))
            }
        }
    }

    async fn produce(&self, target: &PlatformTarget, raw_path: &Path) -> Result<Artifact> {
        let mut artifact = Artifact {
            target: *target,
            version: self.settings.version().clone(),
            path: raw_path.to_path_buf(),
            state: ArtifactState::Raw,
            size: 0,
            checksum: None,
        };

        tokio::fs::copy(self.settings.source(), raw_path)
            .await
            .fs_context("copying payload to", raw_path)?;
        make_executable(raw_path).await?;

        if self.settings.compress() {
            artifact.path = archive_artifact(raw_path, target.archive_format()).await?;
            remove_file_if_exists(raw_path).await?;
            artifact.state = ArtifactState::Archived;
            log::debug!("Archived {} as {}", target, artifact.path.display());
        }

        artifact.size = tokio::fs::metadata(&artifact.path)
            .await
            .fs_context("reading artifact metadata", &artifact.path)?
            .len();
        // Last step: once the line is written the artifact is final.
        let entry = self.checksums.append(&artifact.path).await?;
        artifact.checksum = Some(entry.sha256);
        artifact.state = ArtifactState::Checksummed;

        Ok(artifact)
    }
}

fn per_target(target: &PlatformTarget, error: Error) -> Error {
    match error {
        e @ Error::PerTarget { .. } => e,
        other => Error::PerTarget {
            target: target.to_string(),
            reason: other.to_string(),
        },
    }
}
