//! Bounded retry with backoff.
//!
//! One utility backs both the GitHub publish retries and the docker polling
//! loops: a [`RetryPolicy`] fixes the attempt budget and the delay schedule,
//! and [`retry`] runs an async operation under it until it succeeds, the
//! predicate declares the error permanent, or the budget runs out. Polling
//! policies also carry a wall-clock deadline that cuts off a hung attempt.

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// How the delay between attempts evolves.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Backoff {
    /// Same delay before every retry.
    Fixed(Duration),
    /// `initial * factor^(retry - 1)` before each retry.
    Exponential {
        /// Delay before the first retry
        initial: Duration,
        /// Multiplier applied per retry
        factor: u32,
    },
}

/// Attempt budget plus delay schedule.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Always at least 1.
    pub max_attempts: u32,
    /// Delay schedule between attempts.
    pub backoff: Backoff,
    /// Wall-clock limit for the whole loop, attempts included.
    pub deadline: Option<Duration>,
}

impl RetryPolicy {
    /// Exponential backoff: `max_attempts` total, starting at `initial`, multiplying by `factor`.
    pub fn exponential(max_attempts: u32, initial: Duration, factor: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: Backoff::Exponential { initial, factor },
            deadline: None,
        }
    }

    /// Polling loop: try every `interval` until `timeout` has elapsed.
    ///
    /// Always allows at least one attempt. `timeout` is also the deadline,
    /// so an attempt that hangs is abandoned when it expires.
    pub fn polling(timeout: Duration, interval: Duration) -> Self {
        let interval_ms = interval.as_millis();
        let attempts = if interval_ms == 0 {
            1
        } else {
            (timeout.as_millis() / interval_ms).max(1) + 1
        };
        Self {
            max_attempts: u32::try_from(attempts).unwrap_or(u32::MAX),
            backoff: Backoff::Fixed(interval),
            deadline: Some(timeout),
        }
    }

    /// A single attempt, no retries.
    pub fn once() -> Self {
        Self {
            max_attempts: 1,
            backoff: Backoff::Fixed(Duration::ZERO),
            deadline: None,
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed(delay) => delay,
            Backoff::Exponential { initial, factor } => {
                let exponent = attempt.saturating_sub(1);
                initial.saturating_mul(factor.saturating_pow(exponent))
            }
        }
    }

    /// Upper bound on the total time spent sleeping.
    pub fn total_delay(&self) -> Duration {
        (1..self.max_attempts)
            .map(|attempt| self.delay_after(attempt))
            .fold(Duration::ZERO, Duration::saturating_add)
    }

    /// Time budget reported on failure: the deadline if set, else the total delay.
    pub fn budget(&self) -> Duration {
        self.deadline.unwrap_or_else(|| self.total_delay())
    }
}

/// Why [`retry`] gave up.
#[derive(Debug)]
pub enum RetryError<E> {
    /// The predicate declared the error not worth retrying.
    Permanent(E),
    /// Every attempt failed; carries the last error.
    Exhausted {
        /// Attempts made
        attempts: u32,
        /// Error of the final attempt
        last: E,
    },
    /// The policy deadline passed before an attempt succeeded.
    TimedOut {
        /// Attempts started
        attempts: u32,
        /// Error of the last finished attempt, if any
        last: Option<E>,
    },
}

/// Runs `operation` until it succeeds or the policy gives up.
///
/// `operation` receives the 1-based attempt number. `should_retry` is asked
/// after each failure; returning `false` ends the loop at once with
/// [`RetryError::Permanent`]. With a deadline, a running attempt is dropped
/// when it expires and no retry is scheduled past it.
pub async fn retry<T, E, Op, Fut, P>(
    policy: &RetryPolicy,
    what: &str,
    mut operation: Op,
    should_retry: P,
) -> Result<T, RetryError<E>>
where
    Op: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let deadline = policy.deadline.map(|limit| Instant::now() + limit);
    let mut attempt = 1;
    let mut last = None;
    loop {
        let outcome = match deadline {
            Some(deadline) => match tokio::time::timeout_at(deadline, operation(attempt)).await {
                Ok(outcome) => outcome,
                Err(_) => return Err(RetryError::TimedOut { attempts: attempt, last }),
            },
            None => operation(attempt).await,
        };
        match outcome {
            Ok(value) => {
                if attempt > 1 {
                    log::debug!("{what} succeeded on attempt {attempt}");
                }
                return Ok(value);
            }
            Err(e) if !should_retry(&e) => return Err(RetryError::Permanent(e)),
            Err(e) if attempt >= policy.max_attempts => {
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    last: e,
                });
            }
            Err(e) => {
                let delay = policy.delay_after(attempt);
                if deadline.is_some_and(|deadline| Instant::now() + delay >= deadline) {
                    return Err(RetryError::TimedOut {
                        attempts: attempt,
                        last: Some(e),
                    });
                }
                log::warn!(
                    "{what} failed (attempt {attempt}/{}): {e}; retrying in {}s",
                    policy.max_attempts,
                    delay.as_secs_f32()
                );
                tokio::time::sleep(delay).await;
                last = Some(e);
                attempt += 1;
            }
        }
    }
}
