//! Telemetry API double.
//!
//! Two modes per meter:
//! - scripted: `with_sample_script` fixes the response of every call
//! - stored: without a script, `list_samples` filters the samples seeded with
//!   `with_sample` plus everything injected through `create_sample`
//!
//! # Example
//!
//! ```rust,ignore
//! use telemetry_test_utils::{MockTelemetry, sample};
//!
//! let telemetry = MockTelemetry::new()
//!     .with_sample(sample("img-1", "image"))
//!     .with_alarm_states(vec![AlarmState::InsufficientData, AlarmState::Ok]);
//! ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use telemetry_common::api::TelemetryApi;
use telemetry_common::error::{CollaboratorError, Result};
use telemetry_common::query::ResourceFilter;
use telemetry_common::types::{
    Alarm, AlarmId, AlarmSpec, AlarmState, NewSample, Resource, ResourceId, Sample, Statistic,
};

/// Responses consumed one per call; the last one repeats.
#[derive(Debug, Clone)]
struct Script<T> {
    steps: Vec<Result<T>>,
}

impl<T: Clone> Script<T> {
    fn new(steps: Vec<Result<T>>) -> Self {
        Self { steps }
    }

    fn at(&self, call: usize) -> Option<Result<T>> {
        let idx = call.min(self.steps.len().checked_sub(1)?);
        self.steps.get(idx).cloned()
    }
}

#[derive(Debug, Default)]
struct MockTelemetryInner {
    sample_scripts: HashMap<String, Script<Vec<Sample>>>,
    stored_samples: Vec<Sample>,
    statistic_scripts: HashMap<String, Script<Vec<Statistic>>>,
    alarm_script: Option<Script<AlarmState>>,
    create_sample_error: Option<CollaboratorError>,
    create_alarm_error: Option<CollaboratorError>,

    sample_calls: HashMap<String, usize>,
    statistic_calls: HashMap<String, usize>,
    alarm_state_calls: usize,
    created_samples: Vec<NewSample>,
    created_alarms: Vec<AlarmSpec>,
}

/// Scripted telemetry collaborator.
#[derive(Debug, Clone, Default)]
pub struct MockTelemetry {
    inner: Arc<Mutex<MockTelemetryInner>>,
}

impl MockTelemetry {
    /// An empty telemetry store: every meter returns no samples.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_inner(self, f: impl FnOnce(&mut MockTelemetryInner)) -> Self {
        f(&mut self.inner.lock().unwrap());
        self
    }

    /// Seed the sample store.
    #[must_use]
    pub fn with_sample(self, sample: Sample) -> Self {
        self.with_inner(|inner| inner.stored_samples.push(sample))
    }

    /// Script the sample lists returned for `meter`, one per call.
    #[must_use]
    pub fn with_sample_script(self, meter: &str, ticks: Vec<Vec<Sample>>) -> Self {
        self.with_sample_responses(meter, ticks.into_iter().map(Ok).collect())
    }

    /// Script sample responses for `meter`, including errors.
    #[must_use]
    pub fn with_sample_responses(self, meter: &str, responses: Vec<Result<Vec<Sample>>>) -> Self {
        self.with_inner(|inner| {
            inner
                .sample_scripts
                .insert(meter.to_string(), Script::new(responses));
        })
    }

    /// Script the statistics returned for `meter`, one per call.
    #[must_use]
    pub fn with_statistic_script(self, meter: &str, ticks: Vec<Vec<Statistic>>) -> Self {
        self.with_inner(|inner| {
            inner.statistic_scripts.insert(
                meter.to_string(),
                Script::new(ticks.into_iter().map(Ok).collect()),
            );
        })
    }

    /// Script the state reported for every alarm, one per call.
    #[must_use]
    pub fn with_alarm_states(self, states: Vec<AlarmState>) -> Self {
        self.with_alarm_responses(states.into_iter().map(Ok).collect())
    }

    /// Script alarm state responses, including errors.
    #[must_use]
    pub fn with_alarm_responses(self, responses: Vec<Result<AlarmState>>) -> Self {
        self.with_inner(|inner| inner.alarm_script = Some(Script::new(responses)))
    }

    /// Make `create_sample` fail.
    #[must_use]
    pub fn failing_create_sample(self, error: CollaboratorError) -> Self {
        self.with_inner(|inner| inner.create_sample_error = Some(error))
    }

    /// Make `create_alarm` fail.
    #[must_use]
    pub fn failing_create_alarm(self, error: CollaboratorError) -> Self {
        self.with_inner(|inner| inner.create_alarm_error = Some(error))
    }

    /// Number of `list_samples` calls for `meter`.
    pub fn sample_calls(&self, meter: &str) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.sample_calls.get(meter).copied().unwrap_or(0)
    }

    /// Number of `statistics` calls for `meter`.
    pub fn statistic_calls(&self, meter: &str) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.statistic_calls.get(meter).copied().unwrap_or(0)
    }

    /// Number of `alarm_state` calls.
    pub fn alarm_state_calls(&self) -> usize {
        self.inner.lock().unwrap().alarm_state_calls
    }

    /// Samples injected through `create_sample`.
    pub fn created_samples(&self) -> Vec<NewSample> {
        self.inner.lock().unwrap().created_samples.clone()
    }

    /// Alarms created through `create_alarm`.
    pub fn created_alarms(&self) -> Vec<AlarmSpec> {
        self.inner.lock().unwrap().created_alarms.clone()
    }
}

fn matches_filter(sample: &Sample, meter: &str, filter: &ResourceFilter) -> bool {
    sample.counter_name == meter
        && filter
            .equals("resource")
            .map_or(true, |id| sample.resource_id.as_str() == id)
}

#[async_trait]
impl TelemetryApi for MockTelemetry {
    async fn list_samples(&self, meter: &str, filter: &ResourceFilter) -> Result<Vec<Sample>> {
        let mut inner = self.inner.lock().unwrap();
        let call = {
            let count = inner.sample_calls.entry(meter.to_string()).or_insert(0);
            *count += 1;
            *count - 1
        };

        if let Some(response) = inner.sample_scripts.get(meter).and_then(|s| s.at(call)) {
            return response;
        }

        Ok(inner
            .stored_samples
            .iter()
            .filter(|s| matches_filter(s, meter, filter))
            .cloned()
            .collect())
    }

    async fn statistics(&self, meter: &str, _filter: &ResourceFilter) -> Result<Vec<Statistic>> {
        let mut inner = self.inner.lock().unwrap();
        let call = {
            let count = inner.statistic_calls.entry(meter.to_string()).or_insert(0);
            *count += 1;
            *count - 1
        };

        inner
            .statistic_scripts
            .get(meter)
            .and_then(|s| s.at(call))
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn create_sample(&self, sample: &NewSample) -> Result<Vec<Sample>> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(err) = inner.create_sample_error.clone() {
            return Err(err);
        }

        let stored = Sample {
            resource_id: sample.resource_id.clone(),
            counter_name: sample.counter_name.clone(),
            counter_type: serde_json::to_value(sample.counter_type)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default(),
            counter_unit: sample.counter_unit.clone(),
            counter_volume: sample.counter_volume,
            timestamp: None,
            resource_metadata: sample.resource_metadata.clone(),
        };
        inner.created_samples.push(sample.clone());
        inner.stored_samples.push(stored.clone());
        Ok(vec![stored])
    }

    async fn create_alarm(&self, spec: &AlarmSpec) -> Result<Alarm> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(err) = inner.create_alarm_error.clone() {
            return Err(err);
        }

        inner.created_alarms.push(spec.clone());
        Ok(Alarm {
            alarm_id: AlarmId::new(format!("alarm-{}", inner.created_alarms.len())),
            name: spec.name.clone(),
            state: AlarmState::InsufficientData,
        })
    }

    async fn alarm_state(&self, alarm_id: &AlarmId) -> Result<AlarmState> {
        let mut inner = self.inner.lock().unwrap();
        let call = inner.alarm_state_calls;
        inner.alarm_state_calls += 1;

        match inner.alarm_script.as_ref().and_then(|s| s.at(call)) {
            Some(response) => response,
            None if inner.created_alarms.is_empty() => {
                Err(CollaboratorError::NotFound(format!("alarm {alarm_id}")))
            }
            None => Ok(AlarmState::InsufficientData),
        }
    }

    async fn get_resource(&self, resource_id: &ResourceId) -> Result<Resource> {
        let inner = self.inner.lock().unwrap();
        inner
            .stored_samples
            .iter()
            .find(|s| &s.resource_id == resource_id)
            .map(|s| Resource {
                resource_id: s.resource_id.clone(),
                project_id: None,
                user_id: None,
                metadata: s.resource_metadata.clone(),
            })
            .ok_or_else(|| CollaboratorError::NotFound(format!("resource {resource_id}")))
    }
}
