//! Narrow collaborator interfaces consumed by the checks.
//!
//! The checks never talk to the cloud directly. They go through these
//! traits so scenarios can run against a real deployment or against the
//! scripted doubles in `telemetry-test-utils`.

use crate::error::Result;
use crate::query::ResourceFilter;
use crate::types::{
    Alarm, AlarmId, AlarmSpec, AlarmState, NewSample, Resource, ResourceHandle, ResourceId,
    ResourceSpec, ResourceStatus, Sample, Statistic,
};
use async_trait::async_trait;

/// Telemetry (metering and alarming) query API.
#[async_trait]
pub trait TelemetryApi: Send + Sync {
    /// Samples of `meter` matching `filter`, newest first.
    async fn list_samples(&self, meter: &str, filter: &ResourceFilter) -> Result<Vec<Sample>>;

    /// Aggregated statistics of `meter` over `filter`.
    async fn statistics(&self, meter: &str, filter: &ResourceFilter) -> Result<Vec<Statistic>>;

    /// Inject a sample. Returns the stored samples.
    async fn create_sample(&self, sample: &NewSample) -> Result<Vec<Sample>>;

    /// Create a threshold alarm.
    async fn create_alarm(&self, spec: &AlarmSpec) -> Result<Alarm>;

    /// Current evaluation state of an alarm.
    async fn alarm_state(&self, alarm_id: &AlarmId) -> Result<AlarmState>;

    /// Metadata of a metered resource.
    async fn get_resource(&self, resource_id: &ResourceId) -> Result<Resource>;
}

/// Compute, volume, network, identity, image and data-processing platform.
#[async_trait]
pub trait PlatformApi: Send + Sync {
    /// Create a resource and return its handle without waiting for it to settle.
    async fn create_resource(&self, spec: &ResourceSpec) -> Result<ResourceHandle>;

    /// Current lifecycle status of a resource.
    async fn resource_status(&self, handle: &ResourceHandle) -> Result<ResourceStatus>;

    /// Look up a registered image by name, or any usable image when `name` is `None`.
    async fn find_image(&self, name: Option<&str>) -> Result<Option<ResourceId>>;

    /// Name of the flavor an instance was booted with.
    async fn flavor_name(&self, instance: &ResourceHandle) -> Result<String>;

    /// Image registered for a data-processing plugin and version, if any.
    async fn find_cluster_image(&self, plugin: &str, version: &str) -> Result<Option<ResourceId>>;
}
