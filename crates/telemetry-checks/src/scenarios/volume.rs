//! Block storage notifications.

use super::{check_notifications, create_and_wait, NotificationStep};
use crate::context::ScenarioContext;
use crate::meters::{SNAPSHOT_NOTIFICATIONS, VOLUME_NOTIFICATIONS};
use crate::report::ScenarioReport;
use crate::unique_name;
use crate::verify::{ScenarioError, StepVerifier};
use std::time::Duration;
use telemetry_common::types::{ResourceKind, ResourceSpec};

const SCENARIO: &str = "check_volume_notifications";

const CREATE_TIMEOUT: Duration = Duration::from_secs(60);
const NOTIFICATION_TIMEOUT: Duration = Duration::from_secs(600);

const AVAILABLE: &str = "available";

/// Create a volume and a snapshot of it and wait for their notifications.
pub async fn check_volume_notifications(ctx: &ScenarioContext) -> ScenarioReport {
    let mut verifier = StepVerifier::new(SCENARIO);
    let outcome = steps(ctx, &mut verifier).await;
    verifier.finish(outcome)
}

async fn steps(ctx: &ScenarioContext, verifier: &mut StepVerifier) -> Result<(), ScenarioError> {
    if !ctx.config().volume.has_backend() {
        return Err(ScenarioError::Skipped(
            "There are no cinder nodes or ceph storage for volume".to_string(),
        ));
    }

    let spec = ResourceSpec::new(ResourceKind::Volume, unique_name("ost1_test-volume"));
    let volume = verifier
        .verify(
            CREATE_TIMEOUT,
            1,
            "Creation volume failed",
            "Volume was created",
            || create_and_wait(ctx, &spec, AVAILABLE, CREATE_TIMEOUT),
        )
        .await?;

    check_notifications(
        ctx,
        verifier,
        &volume,
        NotificationStep {
            step: 2,
            timeout: NOTIFICATION_TIMEOUT,
            meters: VOLUME_NOTIFICATIONS,
            fail_message: "Volume notifications are not received.",
            success_message: "Volume notifications are received.",
        },
    )
    .await?;

    let spec = ResourceSpec::new(ResourceKind::Snapshot, unique_name("ost1_test-snapshot"))
        .with_parent(volume.id.clone());
    let snapshot = verifier
        .verify(
            CREATE_TIMEOUT,
            3,
            "Creation volume snapshot failed",
            "Volume snapshot was created",
            || create_and_wait(ctx, &spec, AVAILABLE, CREATE_TIMEOUT),
        )
        .await?;

    check_notifications(
        ctx,
        verifier,
        &snapshot,
        NotificationStep {
            step: 4,
            timeout: NOTIFICATION_TIMEOUT,
            meters: SNAPSHOT_NOTIFICATIONS,
            fail_message: "Volume snapshot notifications are not received.",
            success_message: "Volume snapshot notifications are received.",
        },
    )
    .await
}
