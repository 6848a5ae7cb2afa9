//! Data-processing cluster notifications.

use super::{check_notifications, create_and_wait, NotificationStep};
use crate::context::ScenarioContext;
use crate::meters::SAHARA_CLUSTER_NOTIFICATIONS;
use crate::report::ScenarioReport;
use crate::unique_name;
use crate::verify::{ScenarioError, StepVerifier};
use std::time::Duration;
use telemetry_common::types::{ResourceKind, ResourceSpec};

const SCENARIO: &str = "check_sahara_notifications";

const PLUGIN_NAME: &str = "vanilla";
const HADOOP_VERSION: &str = "2.4.1";

const IMAGE_TIMEOUT: Duration = Duration::from_secs(60);
const CLUSTER_TIMEOUT: Duration = Duration::from_secs(300);
const NOTIFICATION_TIMEOUT: Duration = Duration::from_secs(60);

pub async fn check_sahara_notifications(ctx: &ScenarioContext) -> ScenarioReport {
    let mut verifier = StepVerifier::new(SCENARIO);
    let outcome = steps(ctx, &mut verifier).await;
    verifier.finish(outcome)
}

async fn steps(ctx: &ScenarioContext, verifier: &mut StepVerifier) -> Result<(), ScenarioError> {
    let image = verifier
        .verify(
            IMAGE_TIMEOUT,
            1,
            "Sahara image is not correctly registered or it is not registered at all. \
             Correct image for Sahara not found.",
            "Image was found and registered for Sahara.",
            || ctx.platform().find_cluster_image(PLUGIN_NAME, HADOOP_VERSION),
        )
        .await?;

    let Some(image) = image else {
        return Err(ScenarioError::Skipped(
            "Image for creating Sahara cluster not found".to_string(),
        ));
    };

    let spec = ResourceSpec::new(ResourceKind::Cluster, unique_name("ost1-test-sahara-cluster-"))
        .with_attribute("image_id", image.as_str())
        .with_attribute("plugin_name", PLUGIN_NAME)
        .with_attribute("hadoop_version", HADOOP_VERSION);
    let cluster = verifier
        .verify(
            CLUSTER_TIMEOUT,
            2,
            "Creation of Sahara cluster failed.",
            "Sahara cluster was created",
            || create_and_wait(ctx, &spec, "Active", CLUSTER_TIMEOUT),
        )
        .await?;

    check_notifications(
        ctx,
        verifier,
        &cluster,
        NotificationStep {
            step: 3,
            timeout: NOTIFICATION_TIMEOUT,
            meters: SAHARA_CLUSTER_NOTIFICATIONS,
            fail_message: "Sahara cluster notifications were not received.",
            success_message: "Sahara cluster notifications were received.",
        },
    )
    .await
}
