//! `docker`: build and push the multi-arch image.

use crate::cli::RuntimeConfig;
use crate::cli::docker::{ImagePublisher, ImageRef, PushOutcome};
use crate::error::Result;
use crate::process::{CommandRunner, CommandSpec};

/// Label value used when no revision can be determined
const UNKNOWN_REVISION: &str = "unknown";

pub async fn run<R: CommandRunner>(config: &RuntimeConfig, runner: &R) -> Result<PushOutcome> {
    let image = match &config.image_ref {
        Some(image) => image.clone(),
        None => ImageRef::new(&config.image_name, config.version.clone())?,
    };
    let publisher = ImagePublisher::new(runner, config.image.clone());

    publisher.ensure_builder().await?;
    let revision = resolve_revision(config, runner).await;
    publisher.build_and_push(&image, &config.targets, &revision).await
}

/// `--revision` / `CI_COMMIT_SHA`, else HEAD of the checkout holding the build context.
async fn resolve_revision<R: CommandRunner>(config: &RuntimeConfig, runner: &R) -> String {
    if let Some(revision) = &config.revision {
        return revision.clone();
    }
    let head = CommandSpec::new("git")
        .args(["rev-parse", "HEAD"])
        .current_dir(&config.image.context);
    match runner.run(&head).await {
        Ok(output) if output.success() && !output.stdout.trim().is_empty() => {
            output.stdout.trim().to_string()
        }
        Ok(output) => {
            log::warn!("git rev-parse HEAD failed ({}); labelling revision as {UNKNOWN_REVISION}", output.failure_reason());
            UNKNOWN_REVISION.to_string()
        }
        Err(e) => {
            log::warn!("{e}; labelling revision as {UNKNOWN_REVISION}");
            UNKNOWN_REVISION.to_string()
        }
    }
}
