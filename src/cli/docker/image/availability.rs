//! Docker daemon availability checking.

use crate::bundler::utils::retry::{RetryError, RetryPolicy, retry};
use crate::error::{ReleaseError, Result};
use crate::process::{CommandOutput, CommandRunner, CommandSpec};

use super::config::DOCKER_START_HELP;

/// Runs `command` until it exits 0 or `policy` runs out.
///
/// Failing to spawn the program and non-zero exits are both treated as
/// transient. The policy deadline bounds the whole loop, so a check that
/// hangs does not hold it open.
///
/// # Errors
///
/// [`ReleaseError::Timeout`] once the budget is spent.
pub async fn poll_until_success<R: CommandRunner>(
    runner: &R,
    command: &CommandSpec,
    what: &str,
    policy: &RetryPolicy,
) -> Result<CommandOutput> {
    let outcome = retry(
        policy,
        what,
        |_| async move {
            let output = runner.run(command).await.map_err(|e| e.to_string())?;
            if output.success() {
                Ok(output)
            } else {
                Err(output.failure_reason())
            }
        },
        |_| true,
    )
    .await;

    outcome.map_err(|e| {
        let last = match e {
            RetryError::Permanent(last) | RetryError::Exhausted { last, .. } => last,
            RetryError::TimedOut { last, .. } => {
                last.unwrap_or_else(|| "no attempt finished in time".to_string())
            }
        };
        log::error!("✗ {what}: {last}");
        ReleaseError::Timeout {
            what: what.to_string(),
            seconds: policy.budget().as_secs(),
        }
    })
}

/// Waits until `docker info` answers.
///
/// # Errors
///
/// [`ReleaseError::Timeout`] if the daemon never responds within the budget.
pub async fn wait_for_daemon<R: CommandRunner>(runner: &R, policy: &RetryPolicy) -> Result<()> {
    let info = CommandSpec::new("docker").args(["info", "--format", "{{.ServerVersion}}"]);
    match poll_until_success(runner, &info, "docker daemon", policy).await {
        Ok(output) => {
            log::debug!("docker daemon {} is up", output.stdout.trim());
            Ok(())
        }
        Err(e) => {
            log::error!("Docker daemon is not responding. {DOCKER_START_HELP}");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::testing::ScriptedRunner;
    use std::time::Duration;

    fn fast() -> RetryPolicy {
        RetryPolicy::polling(Duration::from_millis(500), Duration::from_millis(1))
    }

    struct HungRunner;

    impl CommandRunner for HungRunner {
        async fn run(&self, _command: &CommandSpec) -> std::result::Result<CommandOutput, ReleaseError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn daemon_that_comes_up_late_is_accepted() {
        let runner = ScriptedRunner::new().on(
            &["docker", "info"],
            vec![CommandOutput::failed(1, "Cannot connect"), CommandOutput::ok("27.0.1")],
        );
        wait_for_daemon(&runner, &fast()).await.unwrap();
        assert_eq!(runner.calls_matching(&["docker", "info"]).len(), 2);
    }

    #[tokio::test]
    async fn daemon_poll_is_bounded() {
        let runner = ScriptedRunner::new().on(&["docker", "info"], vec![CommandOutput::failed(1, "down")]);
        let policy = fast();
        let err = wait_for_daemon(&runner, &policy).await.unwrap_err();
        assert!(matches!(err, ReleaseError::Timeout { .. }), "{err}");
        let checks = runner.calls_matching(&["docker", "info"]).len();
        assert!((1..=policy.max_attempts as usize).contains(&checks), "{checks}");
    }

    #[tokio::test]
    async fn hung_daemon_is_cut_off_at_the_deadline() {
        let policy = RetryPolicy::polling(Duration::from_millis(50), Duration::from_millis(10));
        let err = tokio::time::timeout(Duration::from_secs(5), wait_for_daemon(&HungRunner, &policy))
            .await
            .expect("poll loop outlived its deadline")
            .unwrap_err();
        assert!(matches!(err, ReleaseError::Timeout { seconds: 0, .. }), "{err}");
    }
}
