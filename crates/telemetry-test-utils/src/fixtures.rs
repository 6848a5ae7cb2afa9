//! Pre-configured test data.

use std::collections::BTreeMap;
use std::time::Duration;
use telemetry_common::config::Config;
use telemetry_common::types::{CounterType, NewSample, ResourceId, Sample, Statistic};

/// Base URL used by configurations built for tests.
pub const TEST_TELEMETRY_URL: &str = "http://telemetry.test:8777";

/// A gauge sample of `meter` for `resource` with volume 1.
pub fn sample(resource: &str, meter: &str) -> Sample {
    Sample {
        resource_id: ResourceId::new(resource),
        counter_name: meter.to_string(),
        counter_type: "gauge".to_string(),
        counter_unit: "unit".to_string(),
        counter_volume: 1.0,
        timestamp: Some("2014-01-01T00:00:00".to_string()),
        resource_metadata: BTreeMap::new(),
    }
}

/// A delta sample ready for injection.
pub fn new_sample(resource: &str, meter: &str) -> NewSample {
    NewSample {
        resource_id: ResourceId::new(resource),
        counter_name: meter.to_string(),
        counter_type: CounterType::Delta,
        counter_unit: meter.to_string(),
        counter_volume: 1.0,
        resource_metadata: BTreeMap::new(),
    }
}

/// A single-period statistic with the given sum.
pub fn statistic(sum: f64) -> Statistic {
    Statistic {
        sum,
        average: sum,
        min: sum,
        max: sum,
        count: 1,
        period: 600,
        period_start: None,
        period_end: None,
    }
}

/// Configuration with a 2s poll interval and every backend enabled.
pub fn test_config() -> Config {
    let mut config = Config::with_url(TEST_TELEMETRY_URL);
    config.poll_interval = Duration::from_secs(2);
    config.volume.cinder_node_exist = true;
    config
}
