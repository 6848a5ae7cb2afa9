//! Telemetry scenarios.
//!
//! Every scenario drives the platform through a [`StepVerifier`] and
//! returns the closed [`ScenarioReport`]. Steps run strictly in order and a
//! scenario stops at its first failed step.

mod alarm;
mod cluster;
mod identity;
mod image;
mod network;
mod samples;
mod volume;

pub use alarm::check_alarm_state;
pub use cluster::check_sahara_notifications;
pub use identity::check_keystone_notifications;
pub use image::check_glance_notifications;
pub use network::check_neutron_notifications;
pub use samples::create_sample;
pub use volume::check_volume_notifications;

use crate::context::ScenarioContext;
use crate::eventual::PollError;
use crate::report::ScenarioReport;
use crate::verify::{ScenarioError, StepVerifier};
use crate::waits::{wait_for_resource_status, wait_metrics};
use std::fmt;
use std::time::Duration;
use telemetry_common::query::ResourceFilter;
use telemetry_common::types::{ResourceHandle, ResourceId, ResourceSpec};
use tracing::info;

/// The scenario suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scenario {
    AlarmState,
    CreateSample,
    VolumeNotifications,
    GlanceNotifications,
    KeystoneNotifications,
    NeutronNotifications,
    SaharaNotifications,
}

impl Scenario {
    pub const ALL: [Scenario; 7] = [
        Scenario::AlarmState,
        Scenario::CreateSample,
        Scenario::VolumeNotifications,
        Scenario::GlanceNotifications,
        Scenario::KeystoneNotifications,
        Scenario::NeutronNotifications,
        Scenario::SaharaNotifications,
    ];

    /// Stable name used in reports and logs
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Scenario::AlarmState => "check_alarm_state",
            Scenario::CreateSample => "create_sample",
            Scenario::VolumeNotifications => "check_volume_notifications",
            Scenario::GlanceNotifications => "check_glance_notifications",
            Scenario::KeystoneNotifications => "check_keystone_notifications",
            Scenario::NeutronNotifications => "check_neutron_notifications",
            Scenario::SaharaNotifications => "check_sahara_notifications",
        }
    }

    /// Find a scenario by its stable name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    pub async fn run(self, ctx: &ScenarioContext) -> ScenarioReport {
        match self {
            Scenario::AlarmState => check_alarm_state(ctx).await,
            Scenario::CreateSample => create_sample(ctx).await,
            Scenario::VolumeNotifications => check_volume_notifications(ctx).await,
            Scenario::GlanceNotifications => check_glance_notifications(ctx).await,
            Scenario::KeystoneNotifications => check_keystone_notifications(ctx).await,
            Scenario::NeutronNotifications => check_neutron_notifications(ctx).await,
            Scenario::SaharaNotifications => check_sahara_notifications(ctx).await,
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Run every scenario one after another.
pub async fn run_suite(ctx: &ScenarioContext) -> Vec<ScenarioReport> {
    let mut reports = Vec::with_capacity(Scenario::ALL.len());
    for scenario in Scenario::ALL {
        let report = scenario.run(ctx).await;
        info!(
            target: "telemetry.checks.scenarios",
            scenario = %scenario,
            status = ?report.status(),
            "Scenario finished"
        );
        reports.push(report);
    }
    reports
}

/// Filter scoping telemetry queries to one platform resource.
pub(crate) fn resource_filter(handle: &ResourceHandle) -> ResourceFilter {
    ResourceFilter::resource(&handle.id)
}

/// Id of the configured test image, or a skip if it is not registered.
pub(crate) async fn require_image(ctx: &ScenarioContext) -> Result<ResourceId, ScenarioError> {
    let name = &ctx.config().compute.image_name;
    match ctx.platform().find_image(Some(name.as_str())).await {
        Ok(Some(id)) => Ok(id),
        Ok(None) => Err(ScenarioError::Skipped(format!("Image {name} is not registered"))),
        Err(err) => Err(ScenarioError::Skipped(format!(
            "Image {name} could not be looked up: {err}"
        ))),
    }
}

/// Create a resource and wait for it to reach `expected`.
pub(crate) async fn create_and_wait(
    ctx: &ScenarioContext,
    spec: &ResourceSpec,
    expected: &str,
    deadline: Duration,
) -> Result<ResourceHandle, PollError> {
    let handle = ctx.platform().create_resource(spec).await?;
    wait_for_resource_status(ctx, &handle, expected, deadline).await?;
    Ok(handle)
}

/// Messages of a notification check step.
pub(crate) struct NotificationStep<'a> {
    pub step: u32,
    pub timeout: Duration,
    pub meters: &'a [&'a str],
    pub fail_message: &'a str,
    pub success_message: &'a str,
}

/// Verify that every meter of `check` is reported for `handle`.
pub(crate) async fn check_notifications(
    ctx: &ScenarioContext,
    verifier: &mut StepVerifier,
    handle: &ResourceHandle,
    check: NotificationStep<'_>,
) -> Result<(), ScenarioError> {
    let filter = resource_filter(handle);
    verifier
        .verify(
            check.timeout,
            check.step,
            check.fail_message,
            check.success_message,
            || wait_metrics(ctx, check.meters, &filter, check.timeout),
        )
        .await
}
