//! GitLab releases through `release-cli`.
//!
//! Assets are not uploaded to GitLab itself: each release links to the file
//! kept as a CI job artifact, so the release is only valid from inside the
//! pipeline that produced the distribution directory.

use super::{Provider, asset_name};
use crate::bundler::{Error as BundlerError, Version, tool_detection::RELEASE_CLI};
use crate::error::{CliError, ReleaseError, Result};
use crate::process::{CommandRunner, CommandSpec};
use serde::Serialize;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use url::Url;

/// Variable `release-cli` reads its credentials from
pub const JOB_TOKEN_VAR: &str = "CI_JOB_TOKEN";

/// CI identity of the job publishing the release.
#[derive(Clone, Eq, PartialEq)]
pub struct GitLabIdentity {
    project_url: Url,
    job_id: String,
    commit_sha: String,
    pipeline_id: String,
    job_token: String,
}

impl fmt::Debug for GitLabIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitLabIdentity")
            .field("project_url", &self.project_url.as_str())
            .field("job_id", &self.job_id)
            .field("commit_sha", &self.commit_sha)
            .field("pipeline_id", &self.pipeline_id)
            .field("job_token", &"<redacted>")
            .finish()
    }
}

impl GitLabIdentity {
    /// Validates the CI variables.
    ///
    /// Each argument is the raw value of the matching `CI_*` variable.
    ///
    /// # Errors
    ///
    /// [`CliError::MissingArgument`] naming the first absent variable (a job
    /// without `CI_JOB_TOKEN` cannot authenticate `release-cli`), or
    /// [`BundlerError::Validation`] if a value is malformed: the project URL
    /// must be `http(s)://…`, job and pipeline ids must be all digits, and the
    /// commit SHA must be hexadecimal.
    pub fn from_ci(
        project_url: Option<&str>,
        job_id: Option<&str>,
        commit_sha: Option<&str>,
        pipeline_id: Option<&str>,
        job_token: Option<&str>,
    ) -> Result<Self> {
        let project_url = required("CI_PROJECT_URL", project_url)?;
        let job_id = required("CI_JOB_ID", job_id)?;
        let commit_sha = required("CI_COMMIT_SHA", commit_sha)?;
        let pipeline_id = required("CI_PIPELINE_ID", pipeline_id)?;
        let job_token = required(JOB_TOKEN_VAR, job_token)?;

        let url = Url::parse(project_url).map_err(|e| {
            BundlerError::Validation(format!("CI_PROJECT_URL '{project_url}' is not a URL: {e}"))
        })?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(BundlerError::Validation(format!(
                "CI_PROJECT_URL '{project_url}' must be an http(s):// URL"
            ))
            .into());
        }
        all_digits("CI_JOB_ID", job_id)?;
        all_digits("CI_PIPELINE_ID", pipeline_id)?;
        if !commit_sha.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(BundlerError::Validation(format!(
                "CI_COMMIT_SHA '{commit_sha}' is not a hex commit id"
            ))
            .into());
        }

        Ok(Self {
            project_url: url,
            job_id: job_id.to_string(),
            commit_sha: commit_sha.to_string(),
            pipeline_id: pipeline_id.to_string(),
            job_token: job_token.to_string(),
        })
    }

    /// Commit the release tag points at.
    pub fn commit_sha(&self) -> &str {
        &self.commit_sha
    }

    /// Raw download URL of a job artifact: `<project>/-/jobs/<id>/artifacts/raw/<path...>`.
    pub fn artifact_url(&self, artifact_path: &[&str]) -> Url {
        let mut url = self.project_url.clone();
        url.set_query(None);
        url.set_fragment(None);
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["-", "jobs", self.job_id.as_str(), "artifacts", "raw"])
                .extend(artifact_path);
        }
        url
    }

    /// Web URL of the pipeline.
    pub fn pipeline_url(&self) -> String {
        format!(
            "{}/-/pipelines/{}",
            self.project_url.as_str().trim_end_matches('/'),
            self.pipeline_id
        )
    }
}

fn required<'v>(name: &str, value: Option<&'v str>) -> Result<&'v str> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(CliError::MissingArgument {
            argument: name.to_string(),
        }
        .into()),
    }
}

fn all_digits(name: &str, value: &str) -> Result<()> {
    if value.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(BundlerError::Validation(format!("{name} '{value}' must be numeric")).into())
    }
}

/// One entry of the `--assets-link` JSON array.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, serde::Deserialize)]
pub struct AssetLink {
    /// Asset file name
    pub name: String,
    /// Download URL
    pub url: String,
    /// Always `package`
    pub link_type: String,
}

/// Builds the asset link array for `assets` stored under `dist_dir` in the job.
pub fn asset_links(identity: &GitLabIdentity, dist_dir: &Path, assets: &[PathBuf]) -> Result<Vec<AssetLink>> {
    let prefix = artifact_prefix(dist_dir);
    assets
        .iter()
        .map(|asset| {
            let name = asset_name(asset)?;
            let mut path: Vec<&str> = prefix.iter().map(String::as_str).collect();
            path.push(name);
            Ok(AssetLink {
                name: name.to_string(),
                url: identity.artifact_url(&path).to_string(),
                link_type: "package".to_string(),
            })
        })
        .collect()
}

/// Path segments of the distribution directory inside the job workspace.
///
/// Relative paths are kept as given; an absolute path is reduced to its last
/// component since the job workspace root is unknown.
fn artifact_prefix(dist_dir: &Path) -> Vec<String> {
    if dist_dir.is_absolute() {
        return dist_dir
            .file_name()
            .map(|n| vec![n.to_string_lossy().into_owned()])
            .unwrap_or_default();
    }
    dist_dir
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}

pub(super) async fn publish<R: CommandRunner>(
    runner: &R,
    identity: &GitLabIdentity,
    version: &Version,
    dist_dir: &Path,
    assets: &[PathBuf],
) -> Result<()> {
    runner.locate(RELEASE_CLI)?;
    let release_cli = || CommandSpec::new(RELEASE_CLI).env(JOB_TOKEN_VAR, identity.job_token.as_str());

    let tag = version.to_string();
    let existing = runner
        .run(&release_cli().args(["get", "--tag-name", tag.as_str()]))
        .await?;
    if existing.success() {
        return Err(ReleaseError::ReleaseExists {
            provider: Provider::GitLab.to_string(),
            version: tag,
        });
    }

    let links = asset_links(identity, dist_dir, assets)?;
    let links_json = serde_json::to_string(&links)?;
    let description = format!("Release {tag}\n\nPipeline: {}", identity.pipeline_url());

    let create = release_cli().args([
        "create",
        "--name",
        tag.as_str(),
        "--tag-name",
        tag.as_str(),
        "--ref",
        identity.commit_sha(),
        "--description",
        description.as_str(),
        "--assets-link",
        links_json.as_str(),
    ]);
    let output = runner.run(&create).await?;
    if !output.success() {
        return Err(ReleaseError::Publish {
            provider: Provider::GitLab.to_string(),
            reason: output.failure_reason(),
        });
    }

    log::info!("✓ GitLab release {tag} published with {} asset link(s)", links.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{CommandOutput, testing::ScriptedRunner};
    use crate::publish::{GitHubOptions, ReleasePublisher};

    fn identity() -> GitLabIdentity {
        GitLabIdentity::from_ci(
            Some("https://gitlab.example.com/acme/foobar"),
            Some("4242"),
            Some("0123abcd"),
            Some("77"),
            Some("job-token-xyz"),
        )
        .unwrap()
    }

    #[test]
    fn identity_requires_every_variable() {
        let err = GitLabIdentity::from_ci(Some("https://x.y/z"), None, Some("ab"), Some("1"), Some("t")).unwrap_err();
        assert!(err.to_string().contains("CI_JOB_ID"), "{err}");
        let err = GitLabIdentity::from_ci(Some("  "), Some("1"), Some("ab"), Some("1"), Some("t")).unwrap_err();
        assert!(err.to_string().contains("CI_PROJECT_URL"), "{err}");
        let err = GitLabIdentity::from_ci(Some("https://x.y/z"), Some("1"), Some("ab"), Some("1"), None).unwrap_err();
        assert!(err.is_preflight());
        assert!(err.to_string().contains("CI_JOB_TOKEN"), "{err}");
    }

    #[test]
    fn identity_rejects_malformed_values() {
        for (url, job, sha, pipeline) in [
            ("ftp://gitlab.example.com/a", "1", "ab", "1"),
            ("gitlab.example.com/a", "1", "ab", "1"),
            ("https://gitlab.example.com/a", "12a", "ab", "1"),
            ("https://gitlab.example.com/a", "1", "ab", "-1"),
            ("https://gitlab.example.com/a", "1", "not-a-sha", "1"),
        ] {
            assert!(
                GitLabIdentity::from_ci(Some(url), Some(job), Some(sha), Some(pipeline), Some("t")).is_err(),
                "{url} {job} {sha} {pipeline}"
            );
        }
    }

    #[test]
    fn links_point_at_job_artifacts_and_serialize_to_valid_json() {
        let assets = vec![
            PathBuf::from("dist/foobar_v1.2.3_linux_amd64.tar.gz"),
            PathBuf::from("dist/we\"ird name.zip"),
        ];
        let links = asset_links(&identity(), Path::new("./dist"), &assets).unwrap();
        assert_eq!(
            links[0].url,
            "https://gitlab.example.com/acme/foobar/-/jobs/4242/artifacts/raw/dist/foobar_v1.2.3_linux_amd64.tar.gz"
        );
        assert!(links.iter().all(|l| l.link_type == "package"));

        let json = serde_json::to_string(&links).unwrap();
        let parsed: Vec<AssetLink> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, links);
        assert_eq!(parsed[1].name, "we\"ird name.zip");
        assert!(!parsed[1].url.contains(' '));
    }

    #[test]
    fn absolute_dist_dir_uses_last_component() {
        let links = asset_links(&identity(), Path::new("/builds/acme/out"), &[PathBuf::from("/builds/acme/out/a.zip")]).unwrap();
        assert!(links[0].url.ends_with("/artifacts/raw/out/a.zip"), "{}", links[0].url);
    }

    #[tokio::test]
    async fn creates_release_with_links_and_pipeline() {
        let runner = ScriptedRunner::new().on(&["release-cli", "get"], vec![CommandOutput::failed(1, "404")]);
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("foobar_v1.2.3_linux_amd64.tar.gz"), b"a").unwrap();
        let publisher = ReleasePublisher::new(&runner, GitHubOptions::default(), Some(identity()));

        publisher
            .publish(Provider::GitLab, &"v1.2.3".parse().unwrap(), dir.path())
            .await
            .unwrap();

        let creates = runner.calls_matching(&["release-cli", "create"]);
        assert_eq!(creates.len(), 1);
        assert!(runner.calls().iter().all(|c| c.env == [(JOB_TOKEN_VAR.to_string(), "job-token-xyz".to_string())]));
        assert!(!creates[0].to_string().contains("job-token-xyz"));
        let args = &creates[0].args;
        let json = args
            .windows(2)
            .find(|w| w[0] == "--assets-link")
            .map(|w| w[1].clone())
            .unwrap();
        let links: Vec<AssetLink> = serde_json::from_str(&json).unwrap();
        assert_eq!(links.len(), 1);
        assert!(args.windows(2).any(|w| w[0] == "--ref" && w[1] == "0123abcd"));
        assert!(args.iter().any(|a| a.contains("/-/pipelines/77")));
    }

    #[test]
    fn debug_output_hides_the_job_token() {
        let shown = format!("{:?}", identity());
        assert!(shown.contains("4242"));
        assert!(!shown.contains("job-token-xyz"));
    }

    #[tokio::test]
    async fn existing_gitlab_release_is_refused() {
        let runner = ScriptedRunner::new();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.zip"), b"a").unwrap();
        let publisher = ReleasePublisher::new(&runner, GitHubOptions::default(), Some(identity()));

        let err = publisher
            .publish(Provider::GitLab, &"v1.2.3".parse().unwrap(), dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, ReleaseError::ReleaseExists { .. }));
        assert!(runner.calls_matching(&["release-cli", "create"]).is_empty());
    }
}
