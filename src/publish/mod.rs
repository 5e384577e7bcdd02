//! Release publication to GitHub and GitLab.
//!
//! [`ReleasePublisher::publish`] checks pre-conditions before any network
//! call (tooling present and authenticated, distribution directory populated,
//! CI identity well-formed), refuses to overwrite an existing release, and then
//! uploads every file in the distribution directory as a release asset.
//!
//! Providers are independent: the caller runs each one and aggregates the
//! outcomes, so a GitHub failure never blocks or rolls back GitLab.

mod github;
mod gitlab;

pub use github::GitHubOptions;
pub use gitlab::{AssetLink, GitLabIdentity, asset_links};

use crate::bundler::{
    Error as BundlerError, Version,
    error::ErrorExt,
    tool_detection::{GH, RELEASE_CLI},
};
use crate::error::Result;
use crate::process::CommandRunner;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// A remote release provider.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Provider {
    /// GitHub releases via the `gh` CLI
    GitHub,
    /// GitLab releases via `release-cli`
    GitLab,
}

impl Provider {
    /// Display name used in logs and errors.
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::GitHub => "GitHub",
            Provider::GitLab => "GitLab",
        }
    }

    /// CLI the provider is driven through.
    pub fn tool(self) -> &'static str {
        match self {
            Provider::GitHub => GH,
            Provider::GitLab => RELEASE_CLI,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = BundlerError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "github" => Ok(Provider::GitHub),
            "gitlab" => Ok(Provider::GitLab),
            other => Err(BundlerError::Validation(format!(
                "unknown release provider '{other}' (expected github or gitlab)"
            ))),
        }
    }
}

/// Publishes a built artifact set to release providers.
pub struct ReleasePublisher<'a, R: CommandRunner> {
    runner: &'a R,
    github: GitHubOptions,
    gitlab: Option<GitLabIdentity>,
}

impl<'a, R: CommandRunner> ReleasePublisher<'a, R> {
    /// Creates a publisher.
    ///
    /// `gitlab` may be `None` when GitLab is not requested; publishing to
    /// GitLab without it is a validation error.
    pub fn new(runner: &'a R, github: GitHubOptions, gitlab: Option<GitLabIdentity>) -> Self {
        Self {
            runner,
            github,
            gitlab,
        }
    }

    /// Publishes every file in `dist_dir` as a release tagged `version`.
    ///
    /// # Errors
    ///
    /// - [`BundlerError::Validation`] if the directory is missing or empty, or
    ///   the GitLab identity is absent
    /// - [`BundlerError::ToolMissing`] if the provider CLI is not installed
    /// - [`crate::ReleaseError::ReleaseExists`] if the tag is already released
    /// - [`crate::ReleaseError::Publish`] / [`crate::ReleaseError::RetriesExhausted`]
    ///   if the upload fails
    pub async fn publish(&self, provider: Provider, version: &Version, dist_dir: &Path) -> Result<()> {
        let assets = collect_assets(dist_dir).await?;
        log::info!(
            "Publishing {} asset(s) for {} to {}",
            assets.len(),
            version,
            provider
        );

        match provider {
            Provider::GitHub => github::publish(self.runner, &self.github, version, &assets).await,
            Provider::GitLab => {
                let identity = self.gitlab.as_ref().ok_or_else(|| {
                    BundlerError::Validation(
                        "GitLab release requested without CI identity (CI_PROJECT_URL, CI_JOB_ID, CI_COMMIT_SHA, CI_PIPELINE_ID, CI_JOB_TOKEN)"
                            .to_string(),
                    )
                })?;
                gitlab::publish(self.runner, identity, version, dist_dir, &assets).await
            }
        }
    }
}

/// Regular files in `dist_dir`, sorted by name. Fails if there are none.
async fn collect_assets(dist_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut reader = match tokio::fs::read_dir(dist_dir).await {
        Ok(reader) => reader,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(BundlerError::Validation(format!(
                "distribution directory {} does not exist",
                dist_dir.display()
            ))
            .into());
        }
        Err(source) => {
            return Err(BundlerError::Fs {
                action: "reading".to_string(),
                path: dist_dir.to_path_buf(),
                source,
            }
            .into());
        }
    };

    let mut assets = Vec::new();
    while let Some(entry) = reader
        .next_entry()
        .await
        .fs_context("reading entry of", dist_dir)?
    {
        let file_type = entry.file_type().await.fs_context("reading file type", entry.path())?;
        if file_type.is_file() {
            assets.push(entry.path());
        }
    }
    if assets.is_empty() {
        return Err(BundlerError::Validation(format!(
            "distribution directory {} is empty",
            dist_dir.display()
        ))
        .into());
    }
    assets.sort();
    Ok(assets)
}

/// File name of an asset path as UTF-8.
fn asset_name(path: &Path) -> Result<&str> {
    path.file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            BundlerError::GenericError(format!("asset has no UTF-8 file name: {}", path.display()))
                .into()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::testing::ScriptedRunner;

    #[tokio::test]
    async fn missing_or_empty_dist_is_rejected_before_any_call() {
        let runner = ScriptedRunner::new();
        let publisher = ReleasePublisher::new(&runner, GitHubOptions::default(), None);
        let version: Version = "v1.0.0".parse().unwrap();

        let dir = tempfile::tempdir().unwrap();
        let err = publisher
            .publish(Provider::GitHub, &version, &dir.path().join("nope"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("does not exist"), "{err}");

        let err = publisher
            .publish(Provider::GitHub, &version, dir.path())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("is empty"), "{err}");
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn gitlab_without_identity_is_a_validation_error() {
        let runner = ScriptedRunner::new();
        let publisher = ReleasePublisher::new(&runner, GitHubOptions::default(), None);
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a"), b"a").unwrap();

        let err = publisher
            .publish(Provider::GitLab, &"v1.0.0".parse().unwrap(), dir.path())
            .await
            .unwrap_err();
        assert!(err.is_preflight());
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn provider_parses_case_insensitively() {
        assert_eq!("GitHub".parse::<Provider>().unwrap(), Provider::GitHub);
        assert_eq!("gitlab".parse::<Provider>().unwrap(), Provider::GitLab);
        assert!("bitbucket".parse::<Provider>().is_err());
    }
}
