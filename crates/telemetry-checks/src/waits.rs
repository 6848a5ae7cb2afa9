//! Telemetry wait operations.
//!
//! Each wait is a probe over the scenario's collaborators fed to
//! [`poll_until`] with the context's polling policy. Probes keep no state
//! between ticks: everything a wait needs is re-queried on every tick.

use crate::context::ScenarioContext;
use crate::eventual::{poll_until, Observation, PollError};
use std::time::Duration;
use telemetry_common::error::CollaboratorError;
use telemetry_common::query::ResourceFilter;
use telemetry_common::types::{AlarmId, AlarmState, ResourceHandle, ResourceStatus, Sample, Statistic};
use tracing::{debug, instrument};

/// Wait until every meter in `names` has at least one sample matching
/// `filter` in the same tick.
///
/// An empty set is satisfied by the first tick.
///
/// # Errors
///
/// [`PollError::Timeout`] naming the meters still missing at the last tick,
/// or [`PollError::Collaborator`] on a non-retryable query error.
#[instrument(skip_all, fields(meters = names.len()))]
pub async fn wait_metrics<S: AsRef<str>>(
    ctx: &ScenarioContext,
    names: &[S],
    filter: &ResourceFilter,
    deadline: Duration,
) -> Result<(), PollError> {
    poll_until(deadline, ctx.poll_policy(), move || async move {
        let mut missing = Vec::new();
        for name in names {
            let name = name.as_ref();
            if ctx.telemetry().list_samples(name, filter).await?.is_empty() {
                missing.push(name);
            }
        }

        if missing.is_empty() {
            return Ok(Observation::Ready(()));
        }
        debug!(target: "telemetry.checks.waits", missing = ?missing, "Metrics pending");
        Ok(Observation::pending(format!(
            "metrics not received: {}",
            missing.join(", ")
        )))
    })
    .await
}

/// Wait until statistics of `meter` over `filter` are computable.
///
/// # Errors
///
/// [`PollError::Timeout`] if the statistics stay empty, or
/// [`PollError::Collaborator`] on a non-retryable query error.
#[instrument(skip_all, fields(meter = %meter))]
pub async fn wait_for_statistic(
    ctx: &ScenarioContext,
    meter: &str,
    filter: &ResourceFilter,
    deadline: Duration,
) -> Result<Vec<Statistic>, PollError> {
    poll_until(deadline, ctx.poll_policy(), move || async move {
        let stats = ctx.telemetry().statistics(meter, filter).await?;
        Ok(if stats.is_empty() {
            Observation::pending(format!("statistic of {meter} not available"))
        } else {
            Observation::Ready(stats)
        })
    })
    .await
}

/// Wait until an alarm has been evaluated (state `ok` or `alarm`).
///
/// # Errors
///
/// [`PollError::Timeout`] if the alarm stays in `insufficient data`, or
/// [`PollError::Collaborator`] on a non-retryable query error.
#[instrument(skip_all, fields(alarm_id = %alarm_id))]
pub async fn wait_for_alarm_status(
    ctx: &ScenarioContext,
    alarm_id: &AlarmId,
    deadline: Duration,
) -> Result<AlarmState, PollError> {
    poll_until(deadline, ctx.poll_policy(), move || async move {
        let state = ctx.telemetry().alarm_state(alarm_id).await?;
        Ok(if state.is_evaluated() {
            Observation::Ready(state)
        } else {
            Observation::pending(format!("alarm {alarm_id} is in state {state}"))
        })
    })
    .await
}

/// Wait until more than `baseline` samples of `meter` match `filter`.
///
/// # Errors
///
/// [`PollError::Timeout`] if the count never grows, or
/// [`PollError::Collaborator`] on a non-retryable query error.
#[instrument(skip_all, fields(meter = %meter, baseline))]
pub async fn wait_samples_count(
    ctx: &ScenarioContext,
    meter: &str,
    filter: &ResourceFilter,
    baseline: usize,
    deadline: Duration,
) -> Result<Vec<Sample>, PollError> {
    poll_until(deadline, ctx.poll_policy(), move || async move {
        let samples = ctx.telemetry().list_samples(meter, filter).await?;
        Ok(if samples.len() > baseline {
            Observation::Ready(samples)
        } else {
            Observation::pending(format!(
                "{} samples of {meter}, waiting for more than {baseline}",
                samples.len()
            ))
        })
    })
    .await
}

/// Wait until a platform resource reports `expected` (case-insensitive).
///
/// # Errors
///
/// [`PollError::Collaborator`] with `ResourceFailed` as soon as the resource
/// enters `ERROR`, [`PollError::Timeout`] if it never settles.
#[instrument(skip_all, fields(resource_id = %handle.id, kind = %handle.kind, expected = %expected))]
pub async fn wait_for_resource_status(
    ctx: &ScenarioContext,
    handle: &ResourceHandle,
    expected: &str,
    deadline: Duration,
) -> Result<ResourceStatus, PollError> {
    poll_until(deadline, ctx.poll_policy(), move || async move {
        let status = ctx.platform().resource_status(handle).await?;
        if status.is(expected) {
            return Ok(Observation::Ready(status));
        }
        if status.is_error() {
            return Err(CollaboratorError::ResourceFailed {
                resource: format!("{} {}", handle.kind, handle.id),
                status: status.to_string(),
            });
        }
        Ok(Observation::pending(format!(
            "{} {} is {status}, waiting for {expected}",
            handle.kind, handle.id
        )))
    })
    .await
}
