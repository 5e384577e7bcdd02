//! foobar_install - install or remove a published foobar release.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use env_logger::Env;
use foobar_release::bundler::Version;
use foobar_release::installer::{
    self, HttpFetcher, InstallRequest, Layout, ReleaseSource, download::DEFAULT_GITLAB_HOST,
};
use std::path::PathBuf;

/// Release host
#[derive(Clone, Copy, Debug, ValueEnum)]
enum Provider {
    Github,
    Gitlab,
}

#[derive(Parser, Debug)]
#[command(name = "foobar_install", version, about = "Install or remove a foobar release")]
struct Cli {
    /// Verbose diagnostics
    #[arg(long, global = true, env = "DEBUG")]
    debug: bool,

    /// Directory tried before ~/.local/bin, /usr/local/bin and ~/bin
    #[arg(long, global = true, value_name = "DIR")]
    install_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Action,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Download, verify and install a release
    Install {
        /// Release tag, e.g. v1.2.3
        #[arg(long, value_name = "TAG")]
        version: String,

        /// Where the release is published
        #[arg(long, value_enum, default_value_t = Provider::Github)]
        provider: Provider,

        /// owner/repo (GitHub) or namespace/project (GitLab)
        #[arg(long, env = "FOOBAR_REPO", value_name = "SLUG", default_value = "foobar-dev/foobar")]
        repo: String,

        /// GitLab instance URL
        #[arg(long, value_name = "URL", default_value = DEFAULT_GITLAB_HOST)]
        gitlab_host: String,

        /// Also install the bash completion script
        #[arg(long)]
        completions: bool,
    },
    /// Remove the binary and completion script from every known location
    Uninstall,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    let layout = Layout::current_user(cli.install_dir.as_deref());
    match cli.command {
        Action::Install {
            version,
            provider,
            repo,
            gitlab_host,
            completions,
        } => {
            let version: Version = version.parse().context("invalid --version")?;
            let source = match provider {
                Provider::Github => ReleaseSource::github(&repo),
                Provider::Gitlab => ReleaseSource::gitlab(&gitlab_host, &repo),
            }
            .context("invalid release location")?;
            let request = InstallRequest::for_host(version, source, completions)?;
            let fetcher = HttpFetcher::new()?;

            let installed = installer::install(&request, &layout, &fetcher)
                .await
                .with_context(|| format!("installing foobar {}", request.version))?;
            println!("{}", installed.binary.display());
        }
        Action::Uninstall => {
            let report = installer::uninstall(&layout).await;
            if report.removed.is_empty() && report.failed.is_empty() {
                log::info!("foobar is not installed");
            }
            if !report.failed.is_empty() {
                bail!(
                    "could not remove: {}",
                    report
                        .failed
                        .iter()
                        .map(|p| p.display().to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }
        }
    }
    Ok(())
}
