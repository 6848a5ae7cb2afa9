//! Platform API double.
//!
//! Provides a mock platform that can be configured to:
//! - Report scripted lifecycle statuses per resource kind
//! - Fail resource creation for a kind
//! - Hide the test image or the data-processing image
//!
//! # Example
//!
//! ```rust,ignore
//! use telemetry_test_utils::MockPlatform;
//!
//! let platform = MockPlatform::new()
//!     .with_statuses(ResourceKind::Instance, &["BUILD", "BUILD", "ACTIVE"])
//!     .with_flavor("m1.small");
//! ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use telemetry_common::api::PlatformApi;
use telemetry_common::error::{CollaboratorError, Result};
use telemetry_common::types::{
    ResourceHandle, ResourceId, ResourceKind, ResourceSpec, ResourceStatus,
};

/// Image id returned by `find_image` unless configured otherwise.
pub const TEST_IMAGE_ID: &str = "image-test";

/// Image id returned by `find_cluster_image` unless configured otherwise.
pub const TEST_CLUSTER_IMAGE_ID: &str = "image-cluster";

fn settled_status(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Volume | ResourceKind::Snapshot => "available",
        ResourceKind::Cluster => "Active",
        _ => "ACTIVE",
    }
}

#[derive(Debug)]
struct MockPlatformInner {
    next_id: usize,
    created: Vec<(ResourceHandle, ResourceSpec)>,
    status_scripts: HashMap<ResourceKind, Vec<String>>,
    status_calls: HashMap<ResourceId, usize>,
    create_errors: HashMap<ResourceKind, CollaboratorError>,
    image: Option<ResourceId>,
    cluster_image: Option<ResourceId>,
    flavor: String,
}

impl Default for MockPlatformInner {
    fn default() -> Self {
        Self {
            next_id: 0,
            created: Vec::new(),
            status_scripts: HashMap::new(),
            status_calls: HashMap::new(),
            create_errors: HashMap::new(),
            image: Some(ResourceId::new(TEST_IMAGE_ID)),
            cluster_image: Some(ResourceId::new(TEST_CLUSTER_IMAGE_ID)),
            flavor: "m1.tiny".to_string(),
        }
    }
}

/// Mock platform that creates resources instantly.
#[derive(Debug, Clone, Default)]
pub struct MockPlatform {
    inner: Arc<Mutex<MockPlatformInner>>,
}

impl MockPlatform {
    /// A platform where every resource settles immediately.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_inner(self, f: impl FnOnce(&mut MockPlatformInner)) -> Self {
        f(&mut self.inner.lock().unwrap());
        self
    }

    /// Script the statuses reported for resources of `kind`, one per call.
    #[must_use]
    pub fn with_statuses(self, kind: ResourceKind, statuses: &[&str]) -> Self {
        let statuses = statuses.iter().map(|s| (*s).to_string()).collect();
        self.with_inner(|inner| {
            inner.status_scripts.insert(kind, statuses);
        })
    }

    /// Make creation of `kind` fail.
    #[must_use]
    pub fn failing_create(self, kind: ResourceKind, error: CollaboratorError) -> Self {
        self.with_inner(|inner| {
            inner.create_errors.insert(kind, error);
        })
    }

    /// Report no registered test image.
    #[must_use]
    pub fn without_image(self) -> Self {
        self.with_inner(|inner| inner.image = None)
    }

    /// Report no image for data-processing clusters.
    #[must_use]
    pub fn without_cluster_image(self) -> Self {
        self.with_inner(|inner| inner.cluster_image = None)
    }

    /// Flavor name reported for every instance.
    #[must_use]
    pub fn with_flavor(self, flavor: &str) -> Self {
        self.with_inner(|inner| inner.flavor = flavor.to_string())
    }

    /// Specs of created resources in creation order.
    pub fn created(&self) -> Vec<ResourceSpec> {
        let inner = self.inner.lock().unwrap();
        inner.created.iter().map(|(_, spec)| spec.clone()).collect()
    }

    /// Handles of created resources of `kind`.
    pub fn created_of(&self, kind: ResourceKind) -> Vec<ResourceHandle> {
        let inner = self.inner.lock().unwrap();
        inner
            .created
            .iter()
            .filter(|(handle, _)| handle.kind == kind)
            .map(|(handle, _)| handle.clone())
            .collect()
    }

    /// Number of status queries for a resource.
    pub fn status_calls(&self, id: &ResourceId) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.status_calls.get(id).copied().unwrap_or(0)
    }
}

#[async_trait]
impl PlatformApi for MockPlatform {
    async fn create_resource(&self, spec: &ResourceSpec) -> Result<ResourceHandle> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(err) = inner.create_errors.get(&spec.kind) {
            return Err(err.clone());
        }

        inner.next_id += 1;
        let handle = ResourceHandle {
            id: ResourceId::new(format!("{}-{}", spec.kind, inner.next_id)),
            kind: spec.kind,
            name: spec.name.clone(),
        };
        inner.created.push((handle.clone(), spec.clone()));
        Ok(handle)
    }

    async fn resource_status(&self, handle: &ResourceHandle) -> Result<ResourceStatus> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.created.iter().any(|(h, _)| h.id == handle.id) {
            return Err(CollaboratorError::NotFound(format!("resource {}", handle.id)));
        }

        let call = {
            let count = inner.status_calls.entry(handle.id.clone()).or_insert(0);
            *count += 1;
            *count - 1
        };

        let status = inner
            .status_scripts
            .get(&handle.kind)
            .and_then(|script| script.get(call).or_else(|| script.last()))
            .cloned()
            .unwrap_or_else(|| settled_status(handle.kind).to_string());
        Ok(ResourceStatus(status))
    }

    async fn find_image(&self, _name: Option<&str>) -> Result<Option<ResourceId>> {
        Ok(self.inner.lock().unwrap().image.clone())
    }

    async fn flavor_name(&self, _instance: &ResourceHandle) -> Result<String> {
        Ok(self.inner.lock().unwrap().flavor.clone())
    }

    async fn find_cluster_image(&self, _plugin: &str, _version: &str) -> Result<Option<ResourceId>> {
        Ok(self.inner.lock().unwrap().cluster_image.clone())
    }
}
