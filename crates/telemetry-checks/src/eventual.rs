//! Eventual consistency helpers for telemetry checks.
//!
//! Telemetry arrives asynchronously: a platform event is emitted, collected
//! and stored some seconds later. Every wait in this crate is a probe that is
//! re-invoked on an interval until it is satisfied or the deadline elapses.
//!
//! The first probe runs immediately. Sleeps are capped at the remaining
//! budget, so a probe that never succeeds is checked one last time at the
//! deadline and the loop returns within one interval of it.

use std::future::Future;
use std::time::Duration;
use telemetry_common::error::CollaboratorError;
use thiserror::Error;
use tokio::time::{sleep, Instant};
use tracing::{debug, trace, warn};

pub use telemetry_common::config::DEFAULT_POLL_INTERVAL;

/// How the delay between probes evolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same interval between every probe
    Fixed,
    /// Double the delay after each probe, up to `max`
    Exponential { max: Duration },
}

/// Interval policy for a polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub backoff: Backoff,
}

impl PollPolicy {
    /// Probe every `interval`.
    #[must_use]
    pub fn fixed(interval: Duration) -> Self {
        Self {
            interval,
            backoff: Backoff::Fixed,
        }
    }

    /// Start at `initial` and double up to `max`.
    #[must_use]
    pub fn exponential(initial: Duration, max: Duration) -> Self {
        Self {
            interval: initial,
            backoff: Backoff::Exponential { max },
        }
    }

    fn next_delay(&self, current: Duration) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.interval,
            Backoff::Exponential { max } => current.saturating_mul(2).min(max),
        }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::fixed(DEFAULT_POLL_INTERVAL)
    }
}

/// Result of a single probe invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Observation<T> {
    /// The condition holds; polling stops with this value
    Ready(T),
    /// Not observable yet; the detail is reported if the deadline elapses
    Pending(String),
}

impl<T> Observation<T> {
    /// Shorthand for `Observation::Pending`
    pub fn pending(detail: impl Into<String>) -> Self {
        Observation::Pending(detail.into())
    }
}

/// Why a polling loop stopped without a value.
#[derive(Debug, Error)]
pub enum PollError {
    #[error("{last} (not satisfied within {waited:?} after {attempts} attempts)")]
    Timeout {
        waited: Duration,
        attempts: u32,
        /// Last pending detail or transient error observed
        last: String,
    },

    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
}

impl PollError {
    /// Whether the loop ran out of time (as opposed to a fatal error)
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, PollError::Timeout { .. })
    }
}

/// Re-invoke `probe` until it is ready or `deadline` elapses.
///
/// Transient collaborator errors count as "not yet" and are retried; any
/// other collaborator error is returned immediately without waiting out the
/// deadline.
///
/// # Errors
///
/// [`PollError::Timeout`] carrying the last observation when the deadline
/// elapses, or [`PollError::Collaborator`] on a non-retryable error.
pub async fn poll_until<T, F, Fut>(
    deadline: Duration,
    policy: PollPolicy,
    mut probe: F,
) -> Result<T, PollError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Observation<T>, CollaboratorError>>,
{
    let start = Instant::now();
    let mut delay = policy.interval;
    let mut attempts: u32 = 0;

    loop {
        attempts = attempts.saturating_add(1);

        let last = match probe().await {
            Ok(Observation::Ready(value)) => {
                debug!(
                    target: "telemetry.checks.poll",
                    attempts,
                    elapsed_ms = elapsed_ms(start),
                    "Probe satisfied"
                );
                return Ok(value);
            }
            Ok(Observation::Pending(detail)) => detail,
            Err(err) if err.is_transient() => {
                debug!(
                    target: "telemetry.checks.poll",
                    attempts,
                    error = %err,
                    "Transient collaborator error, retrying"
                );
                err.to_string()
            }
            Err(err) => {
                warn!(
                    target: "telemetry.checks.poll",
                    attempts,
                    error = %err,
                    "Non-retryable collaborator error"
                );
                return Err(PollError::Collaborator(err));
            }
        };

        let elapsed = start.elapsed();
        if elapsed >= deadline {
            warn!(
                target: "telemetry.checks.poll",
                attempts,
                elapsed_ms = elapsed_ms(start),
                last = %last,
                "Deadline elapsed"
            );
            return Err(PollError::Timeout {
                waited: elapsed,
                attempts,
                last,
            });
        }

        trace!(target: "telemetry.checks.poll", attempts, pending = %last, "Not yet");

        // Cap delay at remaining time
        let remaining = deadline.saturating_sub(elapsed);
        sleep(delay.min(remaining)).await;
        delay = policy.next_delay(delay);
    }
}

/// Assert that a boolean condition becomes true before `deadline`.
///
/// # Errors
///
/// [`PollError::Timeout`] if the condition is still false at the deadline.
pub async fn assert_eventually<F, Fut>(
    deadline: Duration,
    policy: PollPolicy,
    mut condition: F,
) -> Result<(), PollError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    poll_until(deadline, policy, || {
        let check = condition();
        async move {
            Ok(if check.await {
                Observation::Ready(())
            } else {
                Observation::pending("condition not met")
            })
        }
    })
    .await
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
