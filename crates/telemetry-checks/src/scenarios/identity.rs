//! Identity service notifications.

use super::{check_notifications, NotificationStep};
use crate::context::ScenarioContext;
use crate::meters::{
    KEYSTONE_GROUP_NOTIFICATIONS, KEYSTONE_PROJECT_NOTIFICATIONS, KEYSTONE_ROLE_NOTIFICATIONS,
    KEYSTONE_TRUST_NOTIFICATIONS, KEYSTONE_USER_NOTIFICATIONS,
};
use crate::report::ScenarioReport;
use crate::unique_name;
use crate::verify::{ScenarioError, StepVerifier};
use std::time::Duration;
use telemetry_common::error::CollaboratorError;
use telemetry_common::types::{ResourceHandle, ResourceKind, ResourceSpec};

const SCENARIO: &str = "check_keystone_notifications";

const CREATE_TIMEOUT: Duration = Duration::from_secs(60);
const NOTIFICATION_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Debug)]
struct IdentityResources {
    project: ResourceHandle,
    user: ResourceHandle,
    role: ResourceHandle,
    group: ResourceHandle,
    trust: ResourceHandle,
}

pub async fn check_keystone_notifications(ctx: &ScenarioContext) -> ScenarioReport {
    let mut verifier = StepVerifier::new(SCENARIO);
    let outcome = steps(ctx, &mut verifier).await;
    verifier.finish(outcome)
}

async fn steps(ctx: &ScenarioContext, verifier: &mut StepVerifier) -> Result<(), ScenarioError> {
    let created = verifier
        .verify(
            CREATE_TIMEOUT,
            1,
            "Creation of keystone resources failed.",
            "Keystone project, user, role, group and trust were created.",
            || create_identity_resources(ctx),
        )
        .await?;

    let checks = [
        (
            &created.project,
            KEYSTONE_PROJECT_NOTIFICATIONS,
            "Keystone project notifications are not received.",
            "Keystone project notifications are received.",
        ),
        (
            &created.user,
            KEYSTONE_USER_NOTIFICATIONS,
            "Keystone user notifications are not received.",
            "Keystone user notifications are received.",
        ),
        (
            &created.role,
            KEYSTONE_ROLE_NOTIFICATIONS,
            "Keystone role notifications are not received.",
            "Keystone role notifications are received.",
        ),
        (
            &created.group,
            KEYSTONE_GROUP_NOTIFICATIONS,
            "Keystone group notifications are not received.",
            "Keystone group notifications are received.",
        ),
        (
            &created.trust,
            KEYSTONE_TRUST_NOTIFICATIONS,
            "Keystone trust notifications are not received.",
            "Keystone trust notifications are received.",
        ),
    ];

    for (step, (handle, meters, fail_message, success_message)) in (2..).zip(checks) {
        check_notifications(
            ctx,
            verifier,
            handle,
            NotificationStep {
                step,
                timeout: NOTIFICATION_TIMEOUT,
                meters,
                fail_message,
                success_message,
            },
        )
        .await?;
    }

    Ok(())
}

async fn create_identity_resources(
    ctx: &ScenarioContext,
) -> Result<IdentityResources, CollaboratorError> {
    let platform = ctx.platform();

    let project = platform
        .create_resource(&ResourceSpec::new(
            ResourceKind::Project,
            unique_name("ost1_test-ceilo-tenant"),
        ))
        .await?;
    let user = platform
        .create_resource(
            &ResourceSpec::new(ResourceKind::User, unique_name("ost1_test-ceilo-user"))
                .with_parent(project.id.clone()),
        )
        .await?;
    let role = platform
        .create_resource(&ResourceSpec::new(
            ResourceKind::Role,
            unique_name("ost1_test-ceilo-role"),
        ))
        .await?;
    let group = platform
        .create_resource(&ResourceSpec::new(
            ResourceKind::Group,
            unique_name("ost1_test-ceilo-group"),
        ))
        .await?;
    let trust = platform
        .create_resource(
            &ResourceSpec::new(ResourceKind::Trust, unique_name("ost1_test-ceilo-trust"))
                .with_parent(user.id.clone())
                .with_attribute("project_id", project.id.as_str())
                .with_attribute("role_id", role.id.as_str()),
        )
        .await?;

    Ok(IdentityResources {
        project,
        user,
        role,
        group,
        trust,
    })
}
