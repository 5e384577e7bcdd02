//! Multi-architecture image publication.

use crate::bundler::{Error as BundlerError, PlatformTarget, tool_detection::DOCKER};
use crate::error::{CliError, ReleaseError, Result};
use crate::process::{CommandRunner, CommandSpec};
use chrono::{SecondsFormat, Utc};
use std::time::Instant;

use super::availability::wait_for_daemon;
use super::builder::ensure_builder;
use super::config::{ImageOptions, LABEL_CREATED, LABEL_REVISION, LABEL_VERSION};
use super::reference::ImageRef;
use super::utils::humanize_duration;

/// What [`ImagePublisher::build_and_push`] ended up doing.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PushOutcome {
    /// Both tags were already in the registry
    Skipped,
    /// One build pushed both tags
    Pushed,
}

/// Builds and pushes the release image with `docker buildx`.
pub struct ImagePublisher<'a, R: CommandRunner> {
    runner: &'a R,
    options: ImageOptions,
}

impl<'a, R: CommandRunner> ImagePublisher<'a, R> {
    pub fn new(runner: &'a R, options: ImageOptions) -> Self {
        Self { runner, options }
    }

    /// Checks for the docker CLI, waits for the daemon, then prepares the builder.
    ///
    /// # Errors
    ///
    /// [`BundlerError::ToolMissing`] without docker,
    /// [`ReleaseError::Timeout`] if the daemon or builder never become ready.
    pub async fn ensure_builder(&self) -> Result<()> {
        self.runner.locate(DOCKER)?;
        wait_for_daemon(self.runner, &self.options.poll).await?;
        ensure_builder(self.runner, &self.options.builder, &self.options.poll).await
    }

    /// Whether `reference` resolves in its registry.
    pub async fn tag_exists(&self, reference: &str) -> Result<bool> {
        let output = self
            .runner
            .run(&CommandSpec::new(DOCKER).args(["buildx", "imagetools", "inspect", reference]))
            .await?;
        Ok(output.success())
    }

    /// Builds `image` for `platforms` and pushes the version and `latest`
    /// tags from a single build.
    ///
    /// Skips everything when both tags already exist. After the push both
    /// tags must resolve.
    ///
    /// # Errors
    ///
    /// - [`BundlerError::Validation`] if `platforms` has no linux target
    /// - [`CliError::ExecutionFailed`] if the build fails
    /// - [`ReleaseError::RegistryIntegrity`] if a pushed tag cannot be resolved
    pub async fn build_and_push(
        &self,
        image: &ImageRef,
        platforms: &[PlatformTarget],
        revision: &str,
    ) -> Result<PushOutcome> {
        let docker_platforms: Vec<String> = platforms.iter().filter_map(PlatformTarget::docker_platform).collect();
        if docker_platforms.is_empty() {
            return Err(BundlerError::Validation(
                "no linux targets selected; an image needs at least one linux platform".to_string(),
            )
            .into());
        }

        let [version_tag, latest_tag] = image.tags();
        if self.tag_exists(&version_tag).await? && self.tag_exists(&latest_tag).await? {
            log::info!("✓ {version_tag} and {latest_tag} already exist; skipping image build");
            return Ok(PushOutcome::Skipped);
        }

        let created = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let platform_list = docker_platforms.join(",");
        let context = self.options.context.to_string_lossy();
        let build = CommandSpec::new(DOCKER)
            .args(["buildx", "build", "--builder", self.options.builder.as_str()])
            .args(["--platform", platform_list.as_str()])
            .args(["--tag", version_tag.as_str(), "--tag", latest_tag.as_str()])
            .args(["--label".to_string(), format!("{LABEL_CREATED}={created}")])
            .args(["--label".to_string(), format!("{LABEL_VERSION}={}", image.version())])
            .args(["--label".to_string(), format!("{LABEL_REVISION}={revision}")])
            .arg("--push")
            .arg(context);

        log::info!("Building {} for {platform_list}", image.repository());
        let started = Instant::now();
        let output = self.runner.run(&build).await?;
        if !output.success() {
            return Err(CliError::ExecutionFailed {
                command: "docker buildx build".to_string(),
                reason: output.failure_reason(),
            }
            .into());
        }
        log::info!(
            "Pushed {version_tag} and {latest_tag} in {}",
            humanize_duration(started.elapsed().as_secs())
        );

        for tag in [&version_tag, &latest_tag] {
            if !self.tag_exists(tag).await? {
                log::error!("✗ {tag} does not resolve after push");
                return Err(ReleaseError::RegistryIntegrity { tag: tag.clone() });
            }
        }
        log::info!("✓ Image {version_tag} published");
        Ok(PushOutcome::Pushed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::utils::retry::RetryPolicy;
    use crate::process::{CommandOutput, testing::ScriptedRunner};
    use std::path::PathBuf;

    fn options() -> ImageOptions {
        ImageOptions {
            builder: "test-builder".to_string(),
            context: PathBuf::from("ctx"),
            poll: RetryPolicy::once(),
        }
    }

    fn image() -> ImageRef {
        ImageRef::new("registry.example.com/acme/foobar", "v1.2.3".parse().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn existing_tags_skip_the_build() {
        let runner = ScriptedRunner::new();
        let publisher = ImagePublisher::new(&runner, options());

        let outcome = publisher
            .build_and_push(&image(), &PlatformTarget::all(), "abc123")
            .await
            .unwrap();
        assert_eq!(outcome, PushOutcome::Skipped);
        assert!(runner.calls_matching(&["docker", "buildx", "build"]).is_empty());
    }

    #[tokio::test]
    async fn one_build_pushes_both_tags_with_labels() {
        let missing = CommandOutput::failed(1, "not found");
        let runner = ScriptedRunner::new().on(
            &["docker", "buildx", "imagetools", "inspect"],
            vec![missing, CommandOutput::ok(""), CommandOutput::ok("")],
        );
        let publisher = ImagePublisher::new(&runner, options());

        let outcome = publisher
            .build_and_push(&image(), &PlatformTarget::all(), "abc123")
            .await
            .unwrap();
        assert_eq!(outcome, PushOutcome::Pushed);

        let builds = runner.calls_matching(&["docker", "buildx", "build"]);
        assert_eq!(builds.len(), 1);
        let args = &builds[0].args;
        assert!(args.windows(2).any(|w| w[0] == "--platform" && w[1] == "linux/amd64,linux/arm64"));
        assert!(args.iter().any(|a| a == "registry.example.com/acme/foobar:v1.2.3"));
        assert!(args.iter().any(|a| a == "registry.example.com/acme/foobar:latest"));
        assert!(args.iter().any(|a| a == "org.opencontainers.image.version=v1.2.3"));
        assert!(args.iter().any(|a| a == "org.opencontainers.image.revision=abc123"));
        let created = args
            .iter()
            .find_map(|a| a.strip_prefix("org.opencontainers.image.created="))
            .unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(created).is_ok(), "{created}");
        assert!(created.ends_with('Z'));
        assert_eq!(args.last().map(String::as_str), Some("ctx"));
        assert!(args.iter().any(|a| a == "--push"));
    }

    #[tokio::test]
    async fn unresolvable_tag_after_push_is_fatal() {
        let runner = ScriptedRunner::new().on(
            &["docker", "buildx", "imagetools", "inspect"],
            vec![CommandOutput::failed(1, "not found")],
        );
        let publisher = ImagePublisher::new(&runner, options());

        let err = publisher
            .build_and_push(&image(), &PlatformTarget::all(), "abc123")
            .await
            .unwrap_err();
        assert!(matches!(err, ReleaseError::RegistryIntegrity { .. }), "{err}");
        assert_eq!(runner.calls_matching(&["docker", "buildx", "build"]).len(), 1);
    }

    #[tokio::test]
    async fn failed_build_is_reported() {
        let runner = ScriptedRunner::new()
            .on(&["docker", "buildx", "imagetools"], vec![CommandOutput::failed(1, "not found")])
            .on(&["docker", "buildx", "build"], vec![CommandOutput::failed(1, "denied")]);
        let publisher = ImagePublisher::new(&runner, options());

        let err = publisher
            .build_and_push(&image(), &PlatformTarget::all(), "abc123")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("denied"), "{err}");
    }

    #[tokio::test]
    async fn windows_only_targets_cannot_build_an_image() {
        let runner = ScriptedRunner::new();
        let publisher = ImagePublisher::new(&runner, options());
        let targets = [PlatformTarget::new(crate::bundler::Os::Windows, crate::bundler::Arch::Amd64)];

        let err = publisher.build_and_push(&image(), &targets, "abc").await.unwrap_err();
        assert!(err.is_preflight());
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_docker_is_reported_before_any_call() {
        let runner = ScriptedRunner::new().without_tool("docker");
        let publisher = ImagePublisher::new(&runner, options());
        let err = publisher.ensure_builder().await.unwrap_err();
        assert!(err.is_preflight());
        assert!(runner.calls().is_empty());
    }
}
