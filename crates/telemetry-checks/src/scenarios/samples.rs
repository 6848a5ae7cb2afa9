//! Sample injection through the telemetry API.

use super::require_image;
use crate::context::ScenarioContext;
use crate::meters::IMAGE;
use crate::report::ScenarioReport;
use crate::verify::{ScenarioError, StepVerifier};
use crate::waits::wait_samples_count;
use std::collections::BTreeMap;
use std::time::Duration;
use telemetry_common::query::ResourceFilter;
use telemetry_common::types::{CounterType, NewSample, ResourceId};

const SCENARIO: &str = "create_sample";

const LIST_TIMEOUT: Duration = Duration::from_secs(60);
const CREATE_TIMEOUT: Duration = Duration::from_secs(60);
const COUNT_TIMEOUT: Duration = Duration::from_secs(20);
const RESOURCE_TIMEOUT: Duration = Duration::from_secs(20);

/// Inject an image sample and check it is listed and resolvable.
pub async fn create_sample(ctx: &ScenarioContext) -> ScenarioReport {
    let mut verifier = StepVerifier::new(SCENARIO);
    let outcome = steps(ctx, &mut verifier).await;
    verifier.finish(outcome)
}

async fn steps(ctx: &ScenarioContext, verifier: &mut StepVerifier) -> Result<(), ScenarioError> {
    let image = require_image(ctx).await?;
    let filter = ResourceFilter::resource(&image);

    let before = verifier
        .verify(
            LIST_TIMEOUT,
            1,
            "Get samples for update image is failed.",
            "Get samples for update image is successful.",
            || ctx.telemetry().list_samples(IMAGE, &filter),
        )
        .await?;

    let sample = image_sample(&image);
    let created = verifier
        .verify(
            CREATE_TIMEOUT,
            2,
            "Creation sample for update image is failed.",
            "Creation sample for update image is successful.",
            || ctx.telemetry().create_sample(&sample),
        )
        .await?;

    verifier.verify_value(
        3,
        &created.first().map(|s| &s.resource_id),
        &Some(&image),
        "Resource of sample is absent or not equal with expected.",
        "Resource of sample is the image.",
    )?;

    verifier
        .verify(
            COUNT_TIMEOUT,
            4,
            "List of samples after creating test sample isn't greater than initial list of samples",
            "New test sample was added to the list of samples",
            || wait_samples_count(ctx, IMAGE, &filter, before.len(), COUNT_TIMEOUT),
        )
        .await?;

    verifier
        .verify(
            RESOURCE_TIMEOUT,
            5,
            "Getting resource of sample is failed.",
            "Getting resource of sample is successful.",
            || ctx.telemetry().get_resource(&image),
        )
        .await?;

    Ok(())
}

fn image_sample(image: &ResourceId) -> NewSample {
    let mut metadata = BTreeMap::new();
    metadata.insert(
        "user".to_string(),
        serde_json::Value::String("example_metadata".to_string()),
    );

    NewSample {
        resource_id: image.clone(),
        counter_name: IMAGE.to_string(),
        counter_type: CounterType::Delta,
        counter_unit: "image".to_string(),
        counter_volume: 1.0,
        resource_metadata: metadata,
    }
}
