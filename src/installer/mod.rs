//! Installer for published releases.
//!
//! `install` downloads `checksums.txt` and the archive for the host target,
//! checks the archive hash against the manifest, extracts the single binary
//! and places it in the first writable directory of a [`Layout`].
//! `uninstall` removes the binary and completion script from every known
//! location.

pub mod download;
mod error;
pub mod extract;
pub mod layout;

pub use download::{AssetIndex, Fetch, HttpFetcher, ReleaseSource};
pub use error::{InstallError, Result};
pub use layout::{BINARY_NAME, COMPLETION_SCRIPT, Layout};

use crate::bundler::{
    Error as BundlerError, MANIFEST_FILE_NAME, PlatformTarget, Version, archive_file_name,
    error::ErrorExt, parse_manifest, sha256_hex,
    utils::fs::{make_executable, remove_file_if_exists},
};
use extract::extract_single_file;
use std::path::PathBuf;

/// What to install.
#[derive(Clone, Debug)]
pub struct InstallRequest {
    /// Release tag
    pub version: Version,
    /// Provider hosting the release
    pub source: ReleaseSource,
    /// Target whose archive is downloaded
    pub target: PlatformTarget,
    /// Also install the bash completion script
    pub completions: bool,
}

impl InstallRequest {
    /// Request for the machine running the installer.
    pub fn for_host(version: Version, source: ReleaseSource, completions: bool) -> Result<Self> {
        let target = PlatformTarget::host().ok_or(InstallError::UnsupportedHost {
            os: std::env::consts::OS,
            arch: std::env::consts::ARCH,
        })?;
        Ok(Self {
            version,
            source,
            target,
            completions,
        })
    }
}

/// Files written by an install.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Installed {
    pub binary: PathBuf,
    pub completion: Option<PathBuf>,
}

/// Downloads, verifies and installs one release.
pub async fn install<F: Fetch>(request: &InstallRequest, layout: &Layout, fetcher: &F) -> Result<Installed> {
    let tag = request.version.to_string();
    let archive_name = archive_file_name(BINARY_NAME, &request.version, &request.target);
    log::info!("Installing {BINARY_NAME} {tag} for {}", request.target);

    let index = AssetIndex::load(&request.source, &tag, fetcher).await?;
    let manifest = fetcher.fetch(&index.url(MANIFEST_FILE_NAME)?).await?;
    let manifest = String::from_utf8_lossy(&manifest);
    let expected = parse_manifest(&manifest)?
        .into_iter()
        .find(|entry| entry.file_name == archive_name)
        .ok_or_else(|| InstallError::AssetMissing {
            tag: tag.clone(),
            name: archive_name.clone(),
        })?;

    let archive = fetcher.fetch(&index.url(&archive_name)?).await?;
    let actual = sha256_hex(&archive);
    if actual != expected.sha256 {
        return Err(BundlerError::ChecksumMismatch {
            file: archive_name,
            expected: expected.sha256,
            actual,
        }
        .into());
    }
    log::info!("✓ SHA-256 of {archive_name} matches {MANIFEST_FILE_NAME}");

    let binary = extract_single_file(&archive, request.target.archive_format(), &archive_name)?;

    let dir = layout.writable_bin_dir().await?;
    let destination = dir.join(Layout::binary_file_name());
    let partial = dir.join(format!(".{}.partial-{}", Layout::binary_file_name(), std::process::id()));
    tokio::fs::write(&partial, &binary)
        .await
        .fs_context("writing", &partial)?;
    make_executable(&partial).await?;
    if let Err(e) = tokio::fs::rename(&partial, &destination).await {
        remove_file_if_exists(&partial).await?;
        return Err(BundlerError::Fs {
            action: "installing".to_string(),
            path: destination,
            source: e,
        }
        .into());
    }
    log::info!("✓ Installed {}", destination.display());
    if !Layout::on_path(&dir) {
        log::warn!("{} is not on PATH", dir.display());
    }

    let completion = if request.completions {
        Some(install_completion(layout).await?)
    } else {
        None
    };

    Ok(Installed {
        binary: destination,
        completion,
    })
}

async fn install_completion(layout: &Layout) -> Result<PathBuf> {
    let target = layout
        .completion_target()
        .ok_or_else(|| InstallError::Location("no home directory for shell completions".to_string()))?
        .to_path_buf();
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .fs_context("creating", parent)?;
    }
    tokio::fs::write(&target, COMPLETION_SCRIPT)
        .await
        .fs_context("writing", &target)?;
    log::info!("✓ Installed bash completion {}", target.display());
    Ok(target)
}

/// Removes the binary and completion script from every known location.
///
/// Absent files are skipped; files that cannot be checked or removed are
/// logged and reported separately.
pub async fn uninstall(layout: &Layout) -> Uninstalled {
    let mut report = Uninstalled::default();
    for path in layout.binary_paths().into_iter().chain(layout.completion_paths.iter().cloned()) {
        match tokio::fs::try_exists(&path).await {
            Ok(true) => {}
            Ok(false) => continue,
            Err(e) => {
                log::warn!("Could not check {}: {e}", path.display());
                report.failed.push(path);
                continue;
            }
        }
        match remove_file_if_exists(&path).await {
            Ok(()) => {
                log::info!("✓ Removed {}", path.display());
                report.removed.push(path);
            }
            Err(e) => {
                log::warn!("Could not remove {}: {e}", path.display());
                report.failed.push(path);
            }
        }
    }
    report
}

/// Outcome of [`uninstall`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Uninstalled {
    pub removed: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}
