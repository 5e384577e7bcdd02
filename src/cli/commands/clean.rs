//! `clean`: remove the distribution directory.

use crate::bundler::error::ErrorExt;
use crate::bundler::utils::fs::{available_space, ensure_writable, remove_dir_all};
use crate::cli::RuntimeConfig;
use crate::error::{CliError, Result};
use std::path::Path;

/// Free space the parent filesystem must have before removal starts (1 MiB)
pub const MIN_FREE_SPACE: u64 = 1024 * 1024;

/// Removes the distribution directory after checking it is writable and
/// its filesystem is not full. A missing directory is already clean.
pub async fn run(config: &RuntimeConfig) -> Result<()> {
    let dist = &config.dist_dir;
    let exists = tokio::fs::try_exists(dist)
        .await
        .fs_context("checking", dist)?;
    if !exists {
        log::info!("{} does not exist; nothing to clean", dist.display());
        return Ok(());
    }

    ensure_writable(dist).await?;

    let parent = match dist.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let free = available_space(parent)?;
    if free < MIN_FREE_SPACE {
        return Err(CliError::ExecutionFailed {
            command: "clean".to_string(),
            reason: format!(
                "only {free} bytes free on the filesystem of {}; need at least {MIN_FREE_SPACE}",
                parent.display()
            ),
        }
        .into());
    }

    remove_dir_all(dist).await?;
    log::info!("✓ Removed {}", dist.display());
    Ok(())
}
