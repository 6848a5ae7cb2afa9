//! Collaborator bundle handed to every scenario and wait.
//!
//! A [`ScenarioContext`] is built once per run and passed by reference. It
//! owns the configuration, the telemetry and platform collaborators, and the
//! polling policy derived from the configured interval.

use crate::eventual::PollPolicy;
use crate::fixtures::CeilometerClient;
use std::sync::Arc;
use telemetry_common::api::{PlatformApi, TelemetryApi};
use telemetry_common::config::{Config, ConfigError};
use telemetry_common::error::CollaboratorError;
use thiserror::Error;
use tracing::info;

/// Context construction errors.
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Telemetry client error: {0}")]
    Client(#[from] CollaboratorError),
}

/// Configuration and collaborators shared by the steps of a scenario.
#[derive(Clone)]
pub struct ScenarioContext {
    config: Config,
    telemetry: Arc<dyn TelemetryApi>,
    platform: Arc<dyn PlatformApi>,
    poll_policy: PollPolicy,
}

impl std::fmt::Debug for ScenarioContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioContext")
            .field("config", &self.config)
            .field("poll_policy", &self.poll_policy)
            .finish_non_exhaustive()
    }
}

impl ScenarioContext {
    /// Bundle collaborators, polling at the configured fixed interval.
    pub fn new(
        config: Config,
        telemetry: Arc<dyn TelemetryApi>,
        platform: Arc<dyn PlatformApi>,
    ) -> Self {
        let poll_policy = PollPolicy::fixed(config.poll_interval);
        Self {
            config,
            telemetry,
            platform,
            poll_policy,
        }
    }

    /// Load configuration from the environment and talk to the telemetry
    /// API over HTTP.
    ///
    /// # Errors
    ///
    /// Returns `ContextError::Config` for missing or invalid variables and
    /// `ContextError::Client` if the HTTP client cannot be built.
    pub fn from_env(platform: Arc<dyn PlatformApi>) -> Result<Self, ContextError> {
        let config = Config::from_env()?;
        let telemetry = CeilometerClient::from_config(&config)?;

        info!(
            target: "telemetry.checks.context",
            telemetry_url = %config.telemetry_url,
            poll_interval_secs = config.poll_interval.as_secs(),
            "Scenario context ready"
        );

        Ok(Self::new(config, Arc::new(telemetry), platform))
    }

    /// Replace the polling policy (e.g. exponential backoff).
    #[must_use]
    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.poll_policy = policy;
        self
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn telemetry(&self) -> &dyn TelemetryApi {
        self.telemetry.as_ref()
    }

    #[must_use]
    pub fn platform(&self) -> &dyn PlatformApi {
        self.platform.as_ref()
    }

    #[must_use]
    pub fn poll_policy(&self) -> PollPolicy {
        self.poll_policy
    }
}
