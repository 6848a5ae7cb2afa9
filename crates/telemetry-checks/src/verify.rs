//! Step verifier: runs scenario steps and records their outcomes.
//!
//! Each step is an async action closing over its own arguments. The
//! verifier bounds it with a timeout, records a passed or failed
//! [`StepOutcome`] and hands the action's value back so the next step can
//! use it. A scenario never continues past a failed step: the failure is
//! returned as an error for `?` and any later step on the same verifier is
//! refused.
//!
//! ```rust,ignore
//! let mut verifier = StepVerifier::new("check_volume_notifications");
//! let volume = verifier
//!     .verify(budget, 1, "Creation volume failed", "Volume was created", || {
//!         create_volume(ctx)
//!     })
//!     .await?;
//! ```

use crate::report::{ScenarioReport, StepOutcome};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{info, warn};

/// Extra time granted on top of a step's timeout before it is cut off.
///
/// Wait-like actions poll until the same timeout and run one last probe at
/// the deadline; the grace lets that probe finish so its diagnostic is kept.
/// An action that completes after its timeout still fails the step.
pub const DEFAULT_STEP_GRACE: Duration = Duration::from_secs(5);

/// Why a scenario stopped early.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScenarioError {
    #[error("Step {step} failed: {message}")]
    StepFailed { step: u32, message: String },

    /// A precondition is not met; the scenario is skipped, not failed
    #[error("Skipped: {0}")]
    Skipped(String),

    #[error("Scenario aborted after step {step} failed")]
    Aborted { step: u32 },
}

/// Records step outcomes for one scenario.
#[derive(Debug)]
pub struct StepVerifier {
    report: ScenarioReport,
    grace: Duration,
}

impl StepVerifier {
    pub fn new(scenario: impl Into<String>) -> Self {
        Self {
            report: ScenarioReport::new(scenario),
            grace: DEFAULT_STEP_GRACE,
        }
    }

    /// Override the grace period added to every step timeout.
    #[must_use]
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Run `action` as step `step`, bounded by `timeout`.
    ///
    /// On success the value is returned unchanged and a passed outcome is
    /// recorded. On error or timeout a failed outcome carrying
    /// `fail_message` and the error detail is recorded and returned. A
    /// success that lands after `timeout` counts as a timeout.
    ///
    /// # Errors
    ///
    /// [`ScenarioError::StepFailed`] when the action fails, times out or
    /// finishes past `timeout`,
    /// [`ScenarioError::Aborted`] when an earlier step already failed (the
    /// action is not run).
    pub async fn verify<T, E, F, Fut>(
        &mut self,
        timeout: Duration,
        step: u32,
        fail_message: &str,
        success_message: &str,
        action: F,
    ) -> Result<T, ScenarioError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
        T: fmt::Debug,
    {
        self.ensure_not_aborted()?;

        info!(
            target: "telemetry.checks.verify",
            scenario = %self.report.scenario(),
            step,
            timeout_secs = timeout.as_secs(),
            "Running step"
        );

        let start = Instant::now();
        let result = tokio::time::timeout(timeout.saturating_add(self.grace), action()).await;
        let elapsed = start.elapsed();
        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

        match result {
            Ok(Ok(_)) if elapsed > timeout => Err(self.fail(
                step,
                fail_message,
                success_message,
                &format!("exceeded budget: finished after {elapsed:?}, limit {timeout:?}"),
                elapsed_ms,
            )),
            Ok(Ok(value)) => {
                info!(
                    target: "telemetry.checks.verify",
                    scenario = %self.report.scenario(),
                    step,
                    elapsed_ms,
                    "{success_message}"
                );
                self.report.record(StepOutcome::passed(
                    step,
                    success_message,
                    Some(format!("{value:?}")),
                    elapsed_ms,
                ));
                Ok(value)
            }
            Ok(Err(err)) => Err(self.fail(
                step,
                fail_message,
                success_message,
                &err.to_string(),
                elapsed_ms,
            )),
            Err(_) => Err(self.fail(
                step,
                fail_message,
                success_message,
                &format!("timed out after {timeout:?}"),
                elapsed_ms,
            )),
        }
    }

    /// Compare two values as step `step` without any waiting.
    ///
    /// # Errors
    ///
    /// [`ScenarioError::StepFailed`] when the values differ,
    /// [`ScenarioError::Aborted`] when an earlier step already failed.
    pub fn verify_value<V>(
        &mut self,
        step: u32,
        actual: &V,
        expected: &V,
        fail_message: &str,
        success_message: &str,
    ) -> Result<(), ScenarioError>
    where
        V: PartialEq + fmt::Debug + ?Sized,
    {
        self.ensure_not_aborted()?;

        if actual == expected {
            info!(target: "telemetry.checks.verify", step, "{success_message}");
            self.report.record(StepOutcome::passed(
                step,
                success_message,
                Some(format!("{actual:?}")),
                0,
            ));
            return Ok(());
        }

        Err(self.fail(
            step,
            fail_message,
            success_message,
            &format!("expected {expected:?}, got {actual:?}"),
            0,
        ))
    }

    fn fail(
        &mut self,
        step: u32,
        fail_message: &str,
        description: &str,
        detail: &str,
        elapsed_ms: u64,
    ) -> ScenarioError {
        let message = format!("{fail_message} ({detail})");
        warn!(
            target: "telemetry.checks.verify",
            scenario = %self.report.scenario(),
            step,
            elapsed_ms,
            "{message}"
        );
        self.report.record(StepOutcome::failed(
            step,
            description,
            message.clone(),
            elapsed_ms,
        ));
        ScenarioError::StepFailed { step, message }
    }

    fn ensure_not_aborted(&self) -> Result<(), ScenarioError> {
        match self.report.first_failure() {
            Some(failed) => Err(ScenarioError::Aborted {
                step: failed.number,
            }),
            None => Ok(()),
        }
    }

    /// Report assembled so far
    #[must_use]
    pub fn report(&self) -> &ScenarioReport {
        &self.report
    }

    /// Close the scenario with the outcome of its step sequence.
    ///
    /// A skip marks the report skipped and keeps earlier passed steps; a
    /// failure is already recorded by the failed step.
    #[must_use]
    pub fn finish(mut self, outcome: Result<(), ScenarioError>) -> ScenarioReport {
        match outcome {
            Ok(()) => info!(
                target: "telemetry.checks.verify",
                scenario = %self.report.scenario(),
                steps = self.report.steps().len(),
                "Scenario passed"
            ),
            Err(ScenarioError::Skipped(reason)) => {
                info!(
                    target: "telemetry.checks.verify",
                    scenario = %self.report.scenario(),
                    reason = %reason,
                    "Scenario skipped"
                );
                self.report.mark_skipped(reason);
            }
            Err(err) => warn!(
                target: "telemetry.checks.verify",
                scenario = %self.report.scenario(),
                error = %err,
                "Scenario failed"
            ),
        }
        self.report.close();
        self.report
    }
}
