//! Command line interface for the release pipeline.
//!
//! [`Pipeline`] sequences the commands over one resolved [`RuntimeConfig`]:
//!
//! - `build`: package every target and write the manifest
//! - `release`: `build`, then publish to each selected provider
//! - `docker`: build and push the multi-arch image
//! - `clean`: remove the distribution directory
//! - `all`: `clean`, `build`, `release` when a provider is selected, `docker`

mod args;
pub mod commands;
pub mod docker;
pub mod retry_config;

pub use args::{Args, Command, RuntimeConfig};

use crate::error::Result;
use crate::process::CommandRunner;
use clap::CommandFactory;

/// Runs commands against one configuration and process runner.
pub struct Pipeline<'a, R: CommandRunner> {
    config: &'a RuntimeConfig,
    runner: &'a R,
}

impl<'a, R: CommandRunner> Pipeline<'a, R> {
    pub fn new(config: &'a RuntimeConfig, runner: &'a R) -> Self {
        Self { config, runner }
    }

    /// Runs the configured command.
    pub async fn execute(&self) -> Result<()> {
        let config = self.config;
        match config.command {
            Command::Build => commands::build::run(config).await.map(drop),
            Command::Release => commands::release::run(config, self.runner).await,
            Command::Docker => commands::docker::run(config, self.runner).await.map(drop),
            Command::Clean => commands::clean::run(config).await,
            Command::All => self.all().await,
            Command::Help => print_help(),
        }
    }

    async fn all(&self) -> Result<()> {
        let config = self.config;
        commands::release::preflight(config, self.runner)?;
        self.runner.locate(crate::bundler::tool_detection::DOCKER)?;

        commands::clean::run(config).await?;
        commands::build::run(config).await?;
        if config.providers.is_empty() {
            log::info!("No release provider selected; skipping release");
        } else {
            commands::release::publish(config, self.runner).await?;
        }
        commands::docker::run(config, self.runner).await?;
        Ok(())
    }
}

/// Prints the long help text.
pub fn print_help() -> Result<()> {
    Args::command().print_long_help()?;
    Ok(())
}

/// Resolves `args` and runs the command with `runner`.
///
/// `help` is answered before any validation.
pub async fn run<R: CommandRunner>(args: &Args, runner: &R) -> Result<()> {
    if args.command == Command::Help {
        return print_help();
    }
    let config = RuntimeConfig::resolve(args)?;
    log::debug!("{config:#?}");
    Pipeline::new(&config, runner).execute().await
}
