//! File system utilities for packaging and cleanup.
//!
//! All removals are idempotent: a missing path is not an error.

use crate::bundler::{Error, Result, error::ErrorExt};
use std::{io, path::Path};
use tokio::fs;

/// Marks a file as executable (`0o755`). No-op on non-Unix hosts.
pub async fn make_executable(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
            .await
            .fs_context("marking executable", path)?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

/// Removes a file if it exists.
pub async fn remove_file_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).fs_context("removing", path),
    }
}

/// Removes the directory and its contents if it exists.
pub async fn remove_dir_all(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()), // Idempotent
        Err(e) => Err(e).fs_context("removing directory", path),
    }
}

/// Confirms that files can be created and removed inside `dir`.
///
/// Tests with a real file rather than trusting permission bits, which do
/// not account for read-only mounts or ACLs.
pub async fn ensure_writable(dir: &Path) -> Result<()> {
    let metadata = fs::metadata(dir)
        .await
        .fs_context("reading metadata of", dir)?;
    if !metadata.is_dir() {
        return Err(Error::GenericError(format!("{} is not a directory", dir.display())));
    }
    if metadata.permissions().readonly() {
        return Err(Error::GenericError(format!("{} is read-only", dir.display())));
    }

    let marker = dir.join(format!(".write-check-{}", std::process::id()));
    fs::write(&marker, b"")
        .await
        .fs_context("testing write access in", dir)?;
    remove_file_if_exists(&marker).await
}

/// Bytes available to unprivileged users on the filesystem holding `path`.
#[cfg(unix)]
pub fn available_space(path: &Path) -> Result<u64> {
    let stat = nix::sys::statvfs::statvfs(path).map_err(|errno| Error::Fs {
        action: "querying free space of".to_string(),
        path: path.to_path_buf(),
        source: io::Error::from(errno),
    })?;
    // Field widths differ between platforms.
    #[allow(clippy::unnecessary_cast)]
    let available = stat.blocks_available() as u64 * stat.fragment_size() as u64;
    Ok(available)
}

/// Bytes available on the filesystem holding `path`.
///
/// Not measured on this platform; reported as unlimited.
#[cfg(not(unix))]
pub fn available_space(_path: &Path) -> Result<u64> {
    log::warn!("Free-space check is not supported on this platform; skipping");
    Ok(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn removals_are_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("gone");
        remove_file_if_exists(&file).await.unwrap();
        remove_dir_all(&dir.path().join("missing")).await.unwrap();

        std::fs::write(&file, b"x").unwrap();
        remove_file_if_exists(&file).await.unwrap();
        assert!(!file.exists());
    }

    #[tokio::test]
    async fn writable_dir_passes_check_and_leaves_no_trace() {
        let dir = tempfile::tempdir().unwrap();
        ensure_writable(dir.path()).await.unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn file_is_not_a_writable_dir() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain");
        std::fs::write(&file, b"x").unwrap();
        assert!(ensure_writable(&file).await.is_err());
    }

    #[test]
    fn temp_dir_reports_some_space() {
        let dir = tempfile::tempdir().unwrap();
        assert!(available_space(dir.path()).unwrap() > 0);
    }
}
