//! Configuration for the telemetry health checks.
//!
//! Loaded once per process from environment variables and handed to every
//! scenario through the scenario context.

use crate::secret::SecretString;
use std::collections::HashMap;
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Default polling interval for wait operations.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Default per-request HTTP timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Image the compute and sample scenarios expect to be registered.
pub const DEFAULT_TEST_IMAGE: &str = "TestVM";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },
}

/// Compute deployment settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputeConfig {
    /// Instances run on vCenter rather than libvirt
    pub use_vcenter: bool,
    /// Name of the registered test image
    pub image_name: String,
}

/// Volume backend availability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeConfig {
    pub cinder_node_exist: bool,
    pub ceph_exist: bool,
}

impl VolumeConfig {
    /// Whether any block storage backend is deployed
    #[must_use]
    pub fn has_backend(&self) -> bool {
        self.cinder_node_exist || self.ceph_exist
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Telemetry API base URL
    pub telemetry_url: String,
    /// Token sent as `X-Auth-Token`
    pub auth_token: Option<SecretString>,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub compute: ComputeConfig,
    pub volume: VolumeConfig,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or a value
    /// does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or a value
    /// does not parse.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let telemetry_url = vars
            .get("TELEMETRY_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("TELEMETRY_URL".to_string()))?
            .trim_end_matches('/')
            .to_string();

        let auth_token = vars
            .get("TELEMETRY_AUTH_TOKEN")
            .filter(|t| !t.is_empty())
            .map(|t| SecretString::from(t.clone()));

        let poll_interval = parse_secs(vars, "POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL)?;
        let request_timeout = parse_secs(vars, "REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT)?;

        let compute = ComputeConfig {
            use_vcenter: parse_bool(vars, "USE_VCENTER")?,
            image_name: vars
                .get("TEST_IMAGE_NAME")
                .cloned()
                .unwrap_or_else(|| DEFAULT_TEST_IMAGE.to_string()),
        };

        let volume = VolumeConfig {
            cinder_node_exist: parse_bool(vars, "CINDER_NODE_EXIST")?,
            ceph_exist: parse_bool(vars, "CEPH_EXIST")?,
        };

        Ok(Config {
            telemetry_url,
            auth_token,
            poll_interval,
            request_timeout,
            compute,
            volume,
        })
    }

    /// Configuration for local runs against `telemetry_url` with all defaults.
    #[must_use]
    pub fn with_url(telemetry_url: impl Into<String>) -> Self {
        Self {
            telemetry_url: telemetry_url.into(),
            auth_token: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            compute: ComputeConfig {
                use_vcenter: false,
                image_name: DEFAULT_TEST_IMAGE.to_string(),
            },
            volume: VolumeConfig {
                cinder_node_exist: false,
                ceph_exist: false,
            },
        }
    }
}

fn parse_secs(
    vars: &HashMap<String, String>,
    name: &str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    match vars.get(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .ok_or_else(|| ConfigError::InvalidValue {
                name: name.to_string(),
                value: value.clone(),
            }),
    }
}

fn parse_bool(vars: &HashMap<String, String>, name: &str) -> Result<bool, ConfigError> {
    let Some(value) = vars.get(name) else {
        return Ok(false);
    };

    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name: name.to_string(),
            value: value.clone(),
        }),
    }
}
