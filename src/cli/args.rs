//! Command line argument parsing and validation.
//!
//! Arguments are parsed with clap and resolved once into a [`RuntimeConfig`],
//! the explicit configuration every pipeline step receives by reference.

use super::docker::{ImageOptions, ImageRef};
use super::retry_config::{docker_poll_policy, github_publish_policy};
use crate::bundler::{PlatformTarget, Version, parse_target_list};
use crate::error::{CliError, Result};
use crate::publish::{GitHubOptions, GitLabIdentity, Provider};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Pipeline commands.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum Command {
    /// Package the payload for every target and write checksums.txt
    Build,
    /// Build, then publish to the providers selected by --github / --gitlab
    Release,
    /// Build and push the multi-arch container image
    Docker,
    /// Remove the distribution directory
    Clean,
    /// clean, build, release (when a provider is selected), docker
    All,
    /// Print this help
    Help,
}

impl Command {
    fn publishes(self) -> bool {
        matches!(self, Command::Release | Command::All)
    }

    fn pushes_image(self) -> bool {
        matches!(self, Command::Docker | Command::All)
    }
}

/// Multi-target release pipeline for foobar
#[derive(Parser, Debug)]
#[command(
    name = "foobar_release",
    version,
    about = "Multi-target release pipeline for foobar",
    long_about = "Packages the foobar payload for every OS/architecture target, writes a
SHA-256 manifest, publishes GitHub/GitLab releases and pushes a multi-arch
container image.

Usage:
  foobar_release v1.2.3 dist ghcr.io/acme/foobar build --compress
  foobar_release v1.2.3 dist ghcr.io/acme/foobar release --github --gitlab
  foobar_release v1.2.3 dist ghcr.io/acme/foobar all --compress --github

Exit code 0 = every requested step succeeded; 2 = rejected before any side effect."
)]
pub struct Args {
    /// Release version, `v<major>.<minor>.<patch>[-pre]`
    #[arg(id = "release_version", value_name = "VERSION")]
    pub version: String,

    /// Distribution directory receiving the artifacts
    #[arg(value_name = "DIST_DIR")]
    pub dist_dir: PathBuf,

    /// Container repository, e.g. ghcr.io/acme/foobar
    #[arg(value_name = "IMAGE_NAME")]
    pub image_name: String,

    /// Step to run
    #[arg(value_enum, value_name = "COMMAND")]
    pub command: Command,

    /// Pack artifacts (.zip for windows, .tar.gz otherwise) and drop the raw copies
    #[arg(long)]
    pub compress: bool,

    /// Publish a GitHub release
    #[arg(long)]
    pub github: bool,

    /// Publish a GitLab release (needs the CI_* job variables)
    #[arg(long)]
    pub gitlab: bool,

    /// Payload copied into every artifact
    #[arg(long, value_name = "PATH", default_value = "foobar.sh")]
    pub source: PathBuf,

    /// Artifact base name [default: payload file stem]
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,

    /// Comma-separated subset of the target matrix, e.g. linux_amd64,windows_arm64
    #[arg(long, value_name = "OS_ARCH,...")]
    pub targets: Option<String>,

    /// Verbose diagnostics
    #[arg(long, env = "DEBUG")]
    pub debug: bool,

    /// `owner/repo` for gh; inferred from the checkout when unset
    #[arg(long, env = "GITHUB_REPOSITORY", value_name = "OWNER/REPO")]
    pub github_repo: Option<String>,

    /// VCS revision for the image label [default: git rev-parse HEAD]
    #[arg(long, env = "CI_COMMIT_SHA", value_name = "SHA")]
    pub revision: Option<String>,

    /// buildx builder instance name
    #[arg(long, value_name = "NAME", default_value = super::docker::DEFAULT_BUILDER_NAME)]
    pub builder: String,

    /// Image build context
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub context: PathBuf,

    /// GitLab project URL
    #[arg(long, env = "CI_PROJECT_URL", hide = true)]
    pub ci_project_url: Option<String>,

    /// GitLab job id
    #[arg(long, env = "CI_JOB_ID", hide = true)]
    pub ci_job_id: Option<String>,

    /// GitLab pipeline id
    #[arg(long, env = "CI_PIPELINE_ID", hide = true)]
    pub ci_pipeline_id: Option<String>,

    /// GitLab job token used by release-cli
    #[arg(long, env = "CI_JOB_TOKEN", hide = true, hide_env_values = true)]
    pub ci_job_token: Option<String>,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Providers selected by flags, GitHub first.
    pub fn providers(&self) -> Vec<Provider> {
        let mut providers = Vec::new();
        if self.github {
            providers.push(Provider::GitHub);
        }
        if self.gitlab {
            providers.push(Provider::GitLab);
        }
        providers
    }
}

/// Configuration resolved from command line and environment.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub command: Command,
    pub version: Version,
    pub dist_dir: PathBuf,
    pub image_name: String,
    /// Validated image reference, set for `docker` and `all`
    pub image_ref: Option<ImageRef>,
    pub source: PathBuf,
    pub name: Option<String>,
    pub targets: Vec<PlatformTarget>,
    pub compress: bool,
    pub providers: Vec<Provider>,
    pub github: GitHubOptions,
    pub gitlab: Option<GitLabIdentity>,
    pub revision: Option<String>,
    pub image: ImageOptions,
    pub debug: bool,
}

impl RuntimeConfig {
    /// Validates `args` without touching the filesystem or network.
    ///
    /// # Errors
    ///
    /// - [`crate::bundler::Error::Validation`] for a malformed version, target list,
    ///   image name or GitLab identity
    /// - [`CliError::MissingArgument`] for `release` without a provider, or a
    ///   GitLab release without its CI variables
    pub fn resolve(args: &Args) -> Result<Self> {
        let version: Version = args.version.parse()?;

        let targets = match &args.targets {
            Some(list) => parse_target_list(list)?,
            None => PlatformTarget::all(),
        };

        let providers = args.providers();
        if args.command == Command::Release && providers.is_empty() {
            return Err(CliError::MissingArgument {
                argument: "--github and/or --gitlab".to_string(),
            }
            .into());
        }
        if !args.command.publishes() && !providers.is_empty() {
            log::warn!("--github/--gitlab have no effect on the {:?} command", args.command);
        }

        let image_ref = if args.command.pushes_image() {
            Some(ImageRef::new(&args.image_name, version.clone())?)
        } else {
            None
        };

        let gitlab = if args.command.publishes() && args.gitlab {
            Some(GitLabIdentity::from_ci(
                args.ci_project_url.as_deref(),
                args.ci_job_id.as_deref(),
                args.revision.as_deref(),
                args.ci_pipeline_id.as_deref(),
                args.ci_job_token.as_deref(),
            )?)
        } else {
            None
        };

        Ok(Self {
            command: args.command,
            version,
            dist_dir: args.dist_dir.clone(),
            image_name: args.image_name.clone(),
            image_ref,
            source: args.source.clone(),
            name: args.name.clone(),
            targets,
            compress: args.compress,
            providers,
            github: GitHubOptions {
                repo: args.github_repo.clone().filter(|r| !r.trim().is_empty()),
                retry: github_publish_policy(),
            },
            gitlab,
            revision: args.revision.clone().filter(|r| !r.trim().is_empty()),
            image: ImageOptions {
                builder: args.builder.clone(),
                context: args.context.clone(),
                poll: docker_poll_policy(),
            },
            debug: args.debug,
        })
    }
}
