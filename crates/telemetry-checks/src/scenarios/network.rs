//! Networking service notifications.

use super::{check_notifications, NotificationStep};
use crate::context::ScenarioContext;
use crate::meters::{
    NEUTRON_FLOATINGIP_NOTIFICATIONS, NEUTRON_NETWORK_NOTIFICATIONS, NEUTRON_PORT_NOTIFICATIONS,
    NEUTRON_ROUTER_NOTIFICATIONS, NEUTRON_SUBNET_NOTIFICATIONS,
};
use crate::report::ScenarioReport;
use crate::unique_name;
use crate::verify::{ScenarioError, StepVerifier};
use std::time::Duration;
use telemetry_common::error::CollaboratorError;
use telemetry_common::types::{ResourceHandle, ResourceKind, ResourceSpec};

const SCENARIO: &str = "check_neutron_notifications";

const CREATE_TIMEOUT: Duration = Duration::from_secs(60);
const NOTIFICATION_TIMEOUT: Duration = Duration::from_secs(60);

const TEST_CIDR: &str = "10.1.7.0/24";

#[derive(Debug)]
struct NetworkResources {
    network: ResourceHandle,
    subnet: ResourceHandle,
    port: ResourceHandle,
    router: ResourceHandle,
    floating_ip: ResourceHandle,
}

pub async fn check_neutron_notifications(ctx: &ScenarioContext) -> ScenarioReport {
    let mut verifier = StepVerifier::new(SCENARIO);
    let outcome = steps(ctx, &mut verifier).await;
    verifier.finish(outcome)
}

async fn steps(ctx: &ScenarioContext, verifier: &mut StepVerifier) -> Result<(), ScenarioError> {
    let created = verifier
        .verify(
            CREATE_TIMEOUT,
            1,
            "Creation of neutron resources failed.",
            "Neutron network, subnet, port, router and floating ip were created.",
            || create_network_resources(ctx),
        )
        .await?;

    let checks = [
        (
            &created.network,
            NEUTRON_NETWORK_NOTIFICATIONS,
            "Neutron network notifications are not received.",
            "Neutron network notifications are received.",
        ),
        (
            &created.subnet,
            NEUTRON_SUBNET_NOTIFICATIONS,
            "Neutron subnet notifications are not received.",
            "Neutron subnet notifications are received.",
        ),
        (
            &created.port,
            NEUTRON_PORT_NOTIFICATIONS,
            "Neutron port notifications are not received.",
            "Neutron port notifications are received.",
        ),
        (
            &created.router,
            NEUTRON_ROUTER_NOTIFICATIONS,
            "Neutron router notifications are not received.",
            "Neutron router notifications are received.",
        ),
        (
            &created.floating_ip,
            NEUTRON_FLOATINGIP_NOTIFICATIONS,
            "Neutron floating ip notifications are not received.",
            "Neutron floating ip notifications are received.",
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

async fn create_network_resources(
    ctx: &ScenarioContext,
) -> Result<NetworkResources, CollaboratorError> {
    let platform = ctx.platform();

    let network = platform
        .create_resource(&ResourceSpec::new(
            ResourceKind::Network,
            unique_name("ost1_test-network"),
        ))
        .await?;
    let subnet = platform
        .create_resource(
            &ResourceSpec::new(ResourceKind::Subnet, unique_name("ost1_test-subnet"))
                .with_parent(network.id.clone())
                .with_attribute("cidr", TEST_CIDR)
                .with_attribute("ip_version", "4"),
        )
        .await?;
    let port = platform
        .create_resource(
            &ResourceSpec::new(ResourceKind::Port, unique_name("ost1_test-port"))
                .with_parent(network.id.clone()),
        )
        .await?;
    let router = platform
        .create_resource(
            &ResourceSpec::new(ResourceKind::Router, unique_name("ost1_test-router"))
                .with_attribute("subnet_id", subnet.id.as_str()),
        )
        .await?;
    let floating_ip = platform
        .create_resource(
            &ResourceSpec::new(ResourceKind::FloatingIp, unique_name("ost1_test-floatingip"))
                .with_attribute("port_id", port.id.as_str()),
        )
        .await?;

    Ok(NetworkResources {
        network,
        subnet,
        port,
        router,
        floating_ip,
    })
}
