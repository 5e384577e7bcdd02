//! GitHub releases through the `gh` CLI.

use super::{Provider, asset_name};
use crate::bundler::{Version, tool_detection::GH, utils::retry::{RetryError, RetryPolicy, retry}};
use crate::cli::retry_config::github_publish_policy;
use crate::error::{ReleaseError, Result};
use crate::process::{CommandRunner, CommandSpec};
use std::path::PathBuf;

/// GitHub-specific publish settings.
#[derive(Clone, Debug)]
pub struct GitHubOptions {
    /// `owner/repo` passed as `--repo`; `gh` infers it from the checkout when `None`.
    pub repo: Option<String>,
    /// Retry policy for the upload step.
    pub retry: RetryPolicy,
}

impl Default for GitHubOptions {
    fn default() -> Self {
        Self {
            repo: None,
            retry: github_publish_policy(),
        }
    }
}

impl GitHubOptions {
    fn command(&self, args: &[&str]) -> CommandSpec {
        let mut spec = CommandSpec::new(GH).args(args.iter().copied());
        if let Some(repo) = &self.repo {
            spec = spec.args(["--repo", repo.as_str()]);
        }
        spec
    }
}

/// Failure messages worth another upload attempt: timeouts, dropped
/// connections and 5xx answers. Everything else (4xx, auth, validation,
/// existing tag) is final.
const TRANSIENT_MARKERS: &[&str] = &[
    "timeout",
    "timed out",
    "connection reset",
    "connection refused",
    "broken pipe",
    "unexpected eof",
    "tls handshake",
    "temporary failure",
    "http 500",
    "http 502",
    "http 503",
    "http 504",
    "500 internal server error",
    "502 bad gateway",
    "503 service unavailable",
    "504 gateway timeout",
];

fn is_transient(reason: &str) -> bool {
    let reason = reason.to_ascii_lowercase();
    TRANSIENT_MARKERS.iter().any(|marker| reason.contains(marker))
}

pub(super) async fn publish<R: CommandRunner>(
    runner: &R,
    options: &GitHubOptions,
    version: &Version,
    assets: &[PathBuf],
) -> Result<()> {
    runner.locate(GH)?;

    let auth = runner.run(&CommandSpec::new(GH).args(["auth", "status"])).await?;
    if !auth.success() {
        return Err(ReleaseError::Publish {
            provider: Provider::GitHub.to_string(),
            reason: format!("gh is not authenticated ({})", auth.failure_reason()),
        });
    }

    let tag = version.to_string();
    let existing = runner
        .run(&options.command(&["release", "view", tag.as_str()]))
        .await?;
    if existing.success() {
        return Err(ReleaseError::ReleaseExists {
            provider: Provider::GitHub.to_string(),
            version: tag,
        });
    }

    let mut create = options.command(&["release", "create", tag.as_str()]);
    for asset in assets {
        create = create.arg(asset.to_string_lossy());
    }
    let notes = format!("Release {tag}");
    create = create.args(["--title", tag.as_str(), "--notes", notes.as_str()]);
    if version.is_prerelease() {
        create = create.arg("--prerelease");
    }
    for asset in assets {
        log::debug!("  asset: {}", asset_name(asset)?);
    }

    let outcome = retry(
        &options.retry,
        "GitHub release upload",
        |_| {
            let create = &create;
            async move {
                let output = runner.run(create).await.map_err(|e| e.to_string())?;
                if output.success() {
                    Ok(())
                } else {
                    Err(output.failure_reason())
                }
            }
        },
        |reason: &String| is_transient(reason),
    )
    .await;

    match outcome {
        Ok(()) => {
            log::info!("✓ GitHub release {tag} published");
            Ok(())
        }
        Err(RetryError::Exhausted { attempts, last }) => Err(ReleaseError::RetriesExhausted {
            provider: Provider::GitHub.to_string(),
            attempts,
            last,
        }),
        Err(RetryError::TimedOut { attempts, last }) => Err(ReleaseError::RetriesExhausted {
            provider: Provider::GitHub.to_string(),
            attempts,
            last: last.unwrap_or_else(|| "upload timed out".to_string()),
        }),
        Err(RetryError::Permanent(reason)) => Err(ReleaseError::Publish {
            provider: Provider::GitHub.to_string(),
            reason,
        }),
    }
}
