//! buildx builder lifecycle.

use crate::bundler::utils::retry::RetryPolicy;
use crate::error::Result;
use crate::process::{CommandRunner, CommandSpec};

use super::availability::poll_until_success;
use super::config::BUILDER_DRIVER;

/// State of a named builder as reported by `docker buildx inspect`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BuilderStatus {
    /// No builder with that name
    Missing,
    /// Exists and its nodes are running
    Running,
    /// Exists but is stopped, inactive or errored
    Stopped(String),
}

/// Reads the first node `Status:` line of `docker buildx inspect` output.
pub fn parse_status(inspect_output: &str) -> BuilderStatus {
    let status = inspect_output
        .lines()
        .filter_map(|line| line.trim().strip_prefix("Status:"))
        .map(str::trim)
        .next()
        .unwrap_or("unknown");
    if status == "running" {
        BuilderStatus::Running
    } else {
        BuilderStatus::Stopped(status.to_string())
    }
}

/// Looks up builder `name`.
pub async fn inspect_builder<R: CommandRunner>(runner: &R, name: &str) -> Result<BuilderStatus> {
    let output = runner
        .run(&CommandSpec::new("docker").args(["buildx", "inspect", name]))
        .await?;
    if output.success() {
        Ok(parse_status(&output.stdout))
    } else {
        Ok(BuilderStatus::Missing)
    }
}

/// Makes sure a running multi-platform builder called `name` exists.
///
/// A stopped builder is removed and recreated. Creation and bootstrap are
/// each polled under `policy`.
///
/// # Errors
///
/// [`crate::ReleaseError::Timeout`] if a step never succeeds.
pub async fn ensure_builder<R: CommandRunner>(runner: &R, name: &str, policy: &RetryPolicy) -> Result<()> {
    match inspect_builder(runner, name).await? {
        BuilderStatus::Running => {
            log::debug!("buildx builder {name} is running");
            return Ok(());
        }
        BuilderStatus::Stopped(status) => {
            log::warn!("buildx builder {name} is {status}; recreating it");
            let rm = CommandSpec::new("docker").args(["buildx", "rm", name]);
            poll_until_success(runner, &rm, &format!("removing builder {name}"), policy).await?;
        }
        BuilderStatus::Missing => log::info!("Creating buildx builder {name}"),
    }

    let create = CommandSpec::new("docker").args(["buildx", "create", "--name", name, "--driver", BUILDER_DRIVER]);
    poll_until_success(runner, &create, &format!("creating builder {name}"), policy).await?;

    let bootstrap = CommandSpec::new("docker").args(["buildx", "inspect", "--bootstrap", name]);
    poll_until_success(runner, &bootstrap, &format!("bootstrapping builder {name}"), policy).await?;

    log::info!("✓ buildx builder {name} ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{CommandOutput, testing::ScriptedRunner};
    use std::time::Duration;

    const RUNNING: &str = "Name:          foobar-multiarch\nDriver:        docker-container\n\nNodes:\nName:      foobar-multiarch0\nStatus:    running\n";
    const INACTIVE: &str = "Name:   foobar-multiarch\nNodes:\nName:   foobar-multiarch0\nStatus: inactive\n";

    fn fast() -> RetryPolicy {
        RetryPolicy::polling(Duration::from_millis(500), Duration::from_millis(1))
    }

    #[test]
    fn status_is_read_from_inspect_output() {
        assert_eq!(parse_status(RUNNING), BuilderStatus::Running);
        assert_eq!(parse_status(INACTIVE), BuilderStatus::Stopped("inactive".into()));
        assert_eq!(parse_status(""), BuilderStatus::Stopped("unknown".into()));
    }

    #[tokio::test]
    async fn running_builder_is_reused() {
        let runner = ScriptedRunner::new().on(&["docker", "buildx", "inspect"], vec![CommandOutput::ok(RUNNING)]);
        ensure_builder(&runner, "foobar-multiarch", &fast()).await.unwrap();
        assert_eq!(runner.calls().len(), 1);
    }

    #[tokio::test]
    async fn stopped_builder_is_recreated() {
        let runner = ScriptedRunner::new()
            .on(&["docker", "buildx", "inspect", "--bootstrap"], vec![CommandOutput::ok(RUNNING)])
            .on(&["docker", "buildx", "inspect"], vec![CommandOutput::ok(INACTIVE)]);
        ensure_builder(&runner, "foobar-multiarch", &fast()).await.unwrap();

        let argv: Vec<String> = runner.calls().iter().map(|c| c.args[1].clone()).collect();
        assert_eq!(argv, ["inspect", "rm", "create", "inspect"]);
    }

    #[tokio::test]
    async fn missing_builder_is_created_and_bootstrapped_with_polling() {
        let runner = ScriptedRunner::new()
            .on(
                &["docker", "buildx", "inspect", "--bootstrap"],
                vec![CommandOutput::failed(1, "booting"), CommandOutput::ok(RUNNING)],
            )
            .on(&["docker", "buildx", "inspect"], vec![CommandOutput::failed(1, "no builder")]);
        ensure_builder(&runner, "foobar-multiarch", &fast()).await.unwrap();

        let create = runner.calls_matching(&["docker", "buildx", "create"]);
        assert_eq!(create.len(), 1);
        assert!(create[0].args.windows(2).any(|w| w[0] == "--driver" && w[1] == "docker-container"));
        assert!(runner.calls_matching(&["docker", "buildx", "rm"]).is_empty());
        assert_eq!(runner.calls_matching(&["docker", "buildx", "inspect", "--bootstrap"]).len(), 2);
    }

    #[tokio::test]
    async fn builder_that_never_bootstraps_times_out() {
        let runner = ScriptedRunner::new()
            .on(&["docker", "buildx", "inspect", "--bootstrap"], vec![CommandOutput::failed(1, "error")])
            .on(&["docker", "buildx", "inspect"], vec![CommandOutput::failed(1, "no builder")]);
        let err = ensure_builder(&runner, "foobar-multiarch", &fast()).await.unwrap_err();
        assert!(matches!(err, crate::ReleaseError::Timeout { .. }), "{err}");
    }
}
