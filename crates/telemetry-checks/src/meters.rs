//! Meter names expected for each kind of platform resource.

/// Emitted by the compute service when an instance is created.
pub const NOVA_NOTIFICATIONS: &[&str] = &["memory", "vcpus", "disk.root.size", "disk.ephemeral.size"];

/// Collected by the compute agent on libvirt hosts.
pub const NOVA_POLLSTERS: &[&str] = &[
    "instance",
    "cpu",
    "cpu_util",
    "disk.read.requests",
    "disk.write.requests",
    "disk.read.bytes",
    "disk.write.bytes",
    "disk.read.requests.rate",
    "disk.write.requests.rate",
    "disk.read.bytes.rate",
    "disk.write.bytes.rate",
];

/// Collected by the compute agent on vCenter.
pub const NOVA_VSPHERE_POLLSTERS: &[&str] = &[
    "instance",
    "cpu_util",
    "memory.usage",
    "disk.read.bytes.rate",
    "disk.write.bytes.rate",
    "disk.read.requests.rate",
    "disk.write.requests.rate",
    "network.incoming.bytes.rate",
    "network.outgoing.bytes.rate",
    "network.incoming.packets.rate",
    "network.outgoing.packets.rate",
];

pub const VOLUME_NOTIFICATIONS: &[&str] = &["volume", "volume.size"];

pub const SNAPSHOT_NOTIFICATIONS: &[&str] = &["snapshot", "snapshot.size"];

/// Image meter, also the meter test samples are injected into.
pub const IMAGE: &str = "image";

pub const GLANCE_NOTIFICATIONS: &[&str] = &[IMAGE, "image.size", "image.update", "image.upload"];

pub const KEYSTONE_PROJECT_NOTIFICATIONS: &[&str] = &["identity.project.created"];
pub const KEYSTONE_USER_NOTIFICATIONS: &[&str] = &["identity.user.created"];
pub const KEYSTONE_ROLE_NOTIFICATIONS: &[&str] = &["identity.role.created"];
pub const KEYSTONE_GROUP_NOTIFICATIONS: &[&str] = &["identity.group.created"];
pub const KEYSTONE_TRUST_NOTIFICATIONS: &[&str] = &["identity.trust.created"];

pub const NEUTRON_NETWORK_NOTIFICATIONS: &[&str] = &["network", "network.create", "network.update"];
pub const NEUTRON_SUBNET_NOTIFICATIONS: &[&str] = &["subnet", "subnet.create", "subnet.update"];
pub const NEUTRON_PORT_NOTIFICATIONS: &[&str] = &["port", "port.create", "port.update"];
pub const NEUTRON_ROUTER_NOTIFICATIONS: &[&str] = &["router", "router.create", "router.update"];
pub const NEUTRON_FLOATINGIP_NOTIFICATIONS: &[&str] =
    &["ip.floating", "ip.floating.create", "ip.floating.update"];

pub const SAHARA_CLUSTER_NOTIFICATIONS: &[&str] = &["cluster.create", "cluster.update"];

/// Meter aggregated by the alarm scenario.
pub const CPU_UTIL: &str = "cpu_util";

/// Per-flavor instance meter, e.g. `instance:m1.tiny`.
#[must_use]
pub fn instance_flavor_meter(flavor: &str) -> String {
    format!("instance:{flavor}")
}

/// Pollsters expected for an instance of `flavor`.
#[must_use]
pub fn pollsters_for(use_vcenter: bool, flavor: &str) -> Vec<String> {
    let base = if use_vcenter {
        NOVA_VSPHERE_POLLSTERS
    } else {
        NOVA_POLLSTERS
    };
    base.iter()
        .map(|m| (*m).to_string())
        .chain(std::iter::once(instance_flavor_meter(flavor)))
        .collect()
}
