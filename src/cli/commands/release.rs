//! `release`: build, then publish to each requested provider.

use crate::cli::RuntimeConfig;
use crate::error::{ReleaseError, Result};
use crate::process::CommandRunner;
use crate::publish::ReleasePublisher;

/// Checks provider tooling, builds, then publishes.
pub async fn run<R: CommandRunner>(config: &RuntimeConfig, runner: &R) -> Result<()> {
    preflight(config, runner)?;
    super::build::run(config).await?;
    publish(config, runner).await
}

/// Fails before any side effect if a selected provider's CLI is missing.
pub fn preflight<R: CommandRunner>(config: &RuntimeConfig, runner: &R) -> Result<()> {
    for provider in &config.providers {
        runner.locate(provider.tool())?;
    }
    Ok(())
}

/// Publishes the current distribution directory to every requested provider.
///
/// Providers run one after another and independently; a failure is logged
/// by provider name and the next provider is still attempted.
///
/// # Errors
///
/// [`ReleaseError::ProvidersFailed`] naming every provider that failed.
pub async fn publish<R: CommandRunner>(config: &RuntimeConfig, runner: &R) -> Result<()> {
    let publisher = ReleasePublisher::new(runner, config.github.clone(), config.gitlab.clone());

    let mut failed = Vec::new();
    for &provider in &config.providers {
        match publisher.publish(provider, &config.version, &config.dist_dir).await {
            Ok(()) => {}
            Err(e) => {
                log::error!("✗ {provider} release of {} failed: {e}", config.version);
                failed.push(provider.to_string());
            }
        }
    }

    if failed.is_empty() {
        Ok(())
    } else {
        Err(ReleaseError::ProvidersFailed { failed })
    }
}
