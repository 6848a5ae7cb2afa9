//! Common data types for the telemetry health checks.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of a platform resource (instance, volume, image, ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(pub String);

impl ResourceId {
    /// Create a resource identifier
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a telemetry alarm
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlarmId(pub String);

impl AlarmId {
    /// Create an alarm identifier
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for AlarmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// -----------------------------------------------------------------------------
// Telemetry
// -----------------------------------------------------------------------------

/// One observed data point for a meter, scoped to a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub resource_id: ResourceId,
    pub counter_name: String,
    #[serde(default)]
    pub counter_type: String,
    #[serde(default)]
    pub counter_unit: String,
    pub counter_volume: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub resource_metadata: BTreeMap<String, serde_json::Value>,
}

/// How a meter accumulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CounterType {
    Gauge,
    Delta,
    Cumulative,
}

/// A sample injected manually during scenario setup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewSample {
    pub resource_id: ResourceId,
    pub counter_name: String,
    pub counter_type: CounterType,
    pub counter_unit: String,
    pub counter_volume: f64,
    pub resource_metadata: BTreeMap<String, serde_json::Value>,
}

/// Aggregate of a meter over one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistic {
    #[serde(default)]
    pub sum: f64,
    #[serde(rename = "avg", default)]
    pub average: f64,
    #[serde(default)]
    pub min: f64,
    #[serde(default)]
    pub max: f64,
    #[serde(default)]
    pub count: u64,
    /// Period length in seconds
    #[serde(default)]
    pub period: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_end: Option<String>,
}

/// Aggregate function an alarm evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregate {
    Sum,
    Avg,
    Min,
    Max,
    Count,
}

/// Comparison applied between the aggregate and the alarm threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    Lt,
    Le,
    Eq,
    Ne,
    Ge,
    Gt,
}

/// Alarm state as reported by the telemetry API.
///
/// `InsufficientData` is the initial state; the other two mean the alarm
/// has been evaluated at least once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlarmState {
    #[serde(rename = "insufficient data")]
    InsufficientData,
    #[serde(rename = "ok")]
    Ok,
    #[serde(rename = "alarm")]
    Alarm,
}

impl AlarmState {
    /// Whether the alarm left the insufficient-data state.
    #[must_use]
    pub fn is_evaluated(self) -> bool {
        !matches!(self, AlarmState::InsufficientData)
    }
}

impl fmt::Display for AlarmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AlarmState::InsufficientData => "insufficient data",
            AlarmState::Ok => "ok",
            AlarmState::Alarm => "alarm",
        };
        f.write_str(s)
    }
}

/// Threshold alarm definition.
#[derive(Debug, Clone, PartialEq)]
pub struct AlarmSpec {
    pub name: String,
    pub meter_name: String,
    pub threshold: f64,
    /// Evaluation period in seconds
    pub period: u64,
    pub statistic: Aggregate,
    pub comparison_operator: Comparison,
}

/// Alarm as returned after creation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Alarm {
    pub alarm_id: AlarmId,
    pub name: String,
    pub state: AlarmState,
}

/// Metadata the telemetry service keeps for a metered resource.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Resource {
    pub resource_id: ResourceId,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

// -----------------------------------------------------------------------------
// Platform
// -----------------------------------------------------------------------------

/// Kinds of platform resources the scenarios create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Instance,
    Volume,
    Snapshot,
    Image,
    Project,
    User,
    Role,
    Group,
    Trust,
    Network,
    Subnet,
    Port,
    Router,
    FloatingIp,
    Cluster,
}

impl ResourceKind {
    /// Stable lowercase name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Instance => "instance",
            ResourceKind::Volume => "volume",
            ResourceKind::Snapshot => "snapshot",
            ResourceKind::Image => "image",
            ResourceKind::Project => "project",
            ResourceKind::User => "user",
            ResourceKind::Role => "role",
            ResourceKind::Group => "group",
            ResourceKind::Trust => "trust",
            ResourceKind::Network => "network",
            ResourceKind::Subnet => "subnet",
            ResourceKind::Port => "port",
            ResourceKind::Router => "router",
            ResourceKind::FloatingIp => "floating_ip",
            ResourceKind::Cluster => "cluster",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request to create a platform resource.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceSpec {
    pub kind: ResourceKind,
    pub name: String,
    /// Owning resource, e.g. the network of a subnet or the volume of a snapshot
    pub parent: Option<ResourceId>,
    pub attributes: BTreeMap<String, String>,
}

impl ResourceSpec {
    /// Create a spec with no parent and no attributes
    #[must_use]
    pub fn new(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            parent: None,
            attributes: BTreeMap::new(),
        }
    }

    /// Set the owning resource
    #[must_use]
    pub fn with_parent(mut self, parent: ResourceId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Add a kind-specific attribute
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Handle to a created platform resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceHandle {
    pub id: ResourceId,
    pub kind: ResourceKind,
    pub name: String,
}

/// Lifecycle status string reported by the platform (`ACTIVE`, `available`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceStatus(pub String);

impl ResourceStatus {
    /// Case-insensitive comparison against an expected status.
    #[must_use]
    pub fn is(&self, expected: &str) -> bool {
        self.0.eq_ignore_ascii_case(expected)
    }

    /// Whether the platform reports the resource as failed.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.is("error")
    }
}

impl fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
