//! Retry and polling budgets for external services.

use crate::bundler::utils::retry::RetryPolicy;
use std::time::Duration;

/// Total GitHub upload attempts, first try included
pub const GITHUB_MAX_ATTEMPTS: u32 = 3;

/// Delay before the second GitHub attempt; doubles for each later one
pub const GITHUB_INITIAL_DELAY: Duration = Duration::from_secs(5);

/// Backoff multiplier between GitHub attempts
pub const GITHUB_BACKOFF_FACTOR: u32 = 2;

/// How long to wait for the docker daemon or buildx builder (30 seconds)
pub const DOCKER_POLL_TIMEOUT: Duration = Duration::from_secs(30);

/// Pause between docker readiness checks
pub const DOCKER_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Retry policy for `gh release create`.
pub fn github_publish_policy() -> RetryPolicy {
    RetryPolicy::exponential(GITHUB_MAX_ATTEMPTS, GITHUB_INITIAL_DELAY, GITHUB_BACKOFF_FACTOR)
}

/// Polling policy for docker daemon and builder readiness.
pub fn docker_poll_policy() -> RetryPolicy {
    RetryPolicy::polling(DOCKER_POLL_TIMEOUT, DOCKER_POLL_INTERVAL)
}
