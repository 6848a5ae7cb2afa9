//! Instance metering and alarm evaluation.

use super::{require_image, resource_filter};
use crate::context::ScenarioContext;
use crate::eventual::PollError;
use crate::meters::{self, CPU_UTIL, NOVA_NOTIFICATIONS};
use crate::report::ScenarioReport;
use crate::unique_name;
use crate::verify::{ScenarioError, StepVerifier};
use crate::waits::{wait_for_alarm_status, wait_for_resource_status, wait_for_statistic, wait_metrics};
use std::time::Duration;
use telemetry_common::error::CollaboratorError;
use telemetry_common::query::ResourceFilter;
use telemetry_common::types::{
    Aggregate, Alarm, AlarmSpec, Comparison, ResourceHandle, ResourceId, ResourceKind,
    ResourceSpec, Statistic,
};

const SCENARIO: &str = "check_alarm_state";

/// Image booted on vCenter deployments.
const VCENTER_IMAGE: &str = "TestVM-VMDK";

const CREATE_TIMEOUT: Duration = Duration::from_secs(600);
const ACTIVE_TIMEOUT: Duration = Duration::from_secs(200);
const METRICS_TIMEOUT: Duration = Duration::from_secs(600);
const STATISTIC_TIMEOUT: Duration = Duration::from_secs(60);
const ALARM_CREATE_TIMEOUT: Duration = Duration::from_secs(60);
const ALARM_STATE_TIMEOUT: Duration = Duration::from_secs(1000);

/// Alarm evaluation window in seconds.
const ALARM_PERIOD: u64 = 600;

/// Boot an instance, wait for its meters and cpu statistics, then create a
/// `cpu_util` alarm and wait for it to be evaluated.
pub async fn check_alarm_state(ctx: &ScenarioContext) -> ScenarioReport {
    let mut verifier = StepVerifier::new(SCENARIO);
    let outcome = steps(ctx, &mut verifier).await;
    verifier.finish(outcome)
}

async fn steps(ctx: &ScenarioContext, verifier: &mut StepVerifier) -> Result<(), ScenarioError> {
    let image = require_image(ctx).await?;
    let vcenter = ctx.config().compute.use_vcenter;
    let spec = instance_spec(&image, vcenter);

    let instance = verifier
        .verify(
            CREATE_TIMEOUT,
            1,
            "Creation instance is failed.",
            "Instance was created.",
            || ctx.platform().create_resource(&spec),
        )
        .await?;

    verifier
        .verify(
            ACTIVE_TIMEOUT,
            2,
            "Instance is not available.",
            "Instance became available.",
            || wait_for_resource_status(ctx, &instance, "ACTIVE", ACTIVE_TIMEOUT),
        )
        .await?;

    let filter = resource_filter(&instance);
    // vCenter does not emit compute notifications
    let notifications: &[&str] = if vcenter { &[] } else { NOVA_NOTIFICATIONS };
    verifier
        .verify(
            METRICS_TIMEOUT,
            3,
            "Nova notifications is not received.",
            "Nova notifications is received.",
            || wait_metrics(ctx, notifications, &filter, METRICS_TIMEOUT),
        )
        .await?;

    verifier
        .verify(
            METRICS_TIMEOUT,
            4,
            "Nova pollsters is not received.",
            "Nova pollsters is received.",
            || wait_pollsters(ctx, &instance, &filter, vcenter),
        )
        .await?;

    let stats = verifier
        .verify(
            STATISTIC_TIMEOUT,
            5,
            "Statistic for Nova notification:cpu_util is not received.",
            "Statistic for Nova notification:cpu_util is received.",
            || wait_for_statistic(ctx, CPU_UTIL, &filter, STATISTIC_TIMEOUT),
        )
        .await?;

    let alarm = verifier
        .verify(
            ALARM_CREATE_TIMEOUT,
            6,
            "Creation alarm for sum cpu_util is failed.",
            "Creation alarm for sum cpu_util is successful.",
            || create_cpu_alarm(ctx, &stats),
        )
        .await?;

    verifier
        .verify(
            ALARM_STATE_TIMEOUT,
            7,
            "Alarm verify state is failed.",
            "Alarm status became evaluated.",
            || wait_for_alarm_status(ctx, &alarm.alarm_id, ALARM_STATE_TIMEOUT),
        )
        .await?;

    Ok(())
}

fn instance_spec(image: &ResourceId, vcenter: bool) -> ResourceSpec {
    let spec = ResourceSpec::new(ResourceKind::Instance, unique_name("ost1-test-ceilo-instance-"));
    if vcenter {
        spec.with_attribute("image_name", VCENTER_IMAGE)
    } else {
        spec.with_attribute("image", image.as_str())
    }
}

/// Pollsters of the instance plus its `instance:<flavor>` meter.
async fn wait_pollsters(
    ctx: &ScenarioContext,
    instance: &ResourceHandle,
    filter: &ResourceFilter,
    vcenter: bool,
) -> Result<(), PollError> {
    let flavor = ctx.platform().flavor_name(instance).await?;
    let pollsters = meters::pollsters_for(vcenter, &flavor);
    wait_metrics(ctx, &pollsters, filter, METRICS_TIMEOUT).await
}

/// Alarm that fires once the summed cpu usage drops below the observed sum.
async fn create_cpu_alarm(
    ctx: &ScenarioContext,
    stats: &[Statistic],
) -> Result<Alarm, CollaboratorError> {
    let first = stats.first().ok_or_else(|| {
        CollaboratorError::InvalidResponse(format!("no {CPU_UTIL} statistic to derive a threshold"))
    })?;

    let spec = AlarmSpec {
        name: unique_name("ceilometer-alarm"),
        meter_name: CPU_UTIL.to_string(),
        threshold: first.sum - 1.0,
        period: ALARM_PERIOD,
        statistic: Aggregate::Sum,
        comparison_operator: Comparison::Lt,
    };
    ctx.telemetry().create_alarm(&spec).await
}
