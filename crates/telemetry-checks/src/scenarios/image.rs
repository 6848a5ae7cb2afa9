//! Image service notifications.

use super::{check_notifications, create_and_wait, NotificationStep};
use crate::context::ScenarioContext;
use crate::meters::GLANCE_NOTIFICATIONS;
use crate::report::ScenarioReport;
use crate::unique_name;
use crate::verify::{ScenarioError, StepVerifier};
use std::time::Duration;
use telemetry_common::types::{ResourceKind, ResourceSpec};

const SCENARIO: &str = "check_glance_notifications";

const CREATE_TIMEOUT: Duration = Duration::from_secs(60);
const NOTIFICATION_TIMEOUT: Duration = Duration::from_secs(600);

pub async fn check_glance_notifications(ctx: &ScenarioContext) -> ScenarioReport {
    let mut verifier = StepVerifier::new(SCENARIO);
    let outcome = steps(ctx, &mut verifier).await;
    verifier.finish(outcome)
}

async fn steps(ctx: &ScenarioContext, verifier: &mut StepVerifier) -> Result<(), ScenarioError> {
    let spec = ResourceSpec::new(ResourceKind::Image, unique_name("ost1-test-image-"))
        .with_attribute("disk_format", "raw")
        .with_attribute("container_format", "bare");
    let image = verifier
        .verify(
            CREATE_TIMEOUT,
            1,
            "Creation image failed.",
            "Image was created.",
            || create_and_wait(ctx, &spec, "active", CREATE_TIMEOUT),
        )
        .await?;

    check_notifications(
        ctx,
        verifier,
        &image,
        NotificationStep {
            step: 2,
            timeout: NOTIFICATION_TIMEOUT,
            meters: GLANCE_NOTIFICATIONS,
            fail_message: "Glance notifications are not received.",
            success_message: "Glance notifications are received.",
        },
    )
    .await
}
