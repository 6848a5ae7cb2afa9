//! Telemetry Health Checks
//!
//! Scenario verification engine for a cloud telemetry (metering and
//! alarming) service. Scenarios drive the platform through its APIs and
//! wait for the usage samples, statistics and alarm evaluations the
//! telemetry service is expected to produce.
//!
//! # Layers
//!
//! - `eventual`: deadline-bounded polling of a probe
//! - `waits`: metric, statistic, alarm, sample-count and resource-status waits
//! - `verify`: step verifier recording pass/fail outcomes
//! - `report`: scenario report with JSON export
//! - `scenarios`: the scenario suite
//!
//! # Features
//!
//! - `live`: run the live tests under `tests/` against a real deployment
//!
//! # Usage
//!
//! ```bash
//! # Unit and mock-driven scenario tests
//! cargo test -p telemetry-checks
//!
//! # Against a deployment
//! TELEMETRY_URL=http://controller:8777 TELEMETRY_AUTH_TOKEN=... \
//!     cargo test -p telemetry-checks --features live
//! ```

pub mod context;
pub mod eventual;
pub mod fixtures;
pub mod meters;
pub mod report;
pub mod scenarios;
pub mod verify;
pub mod waits;

pub use context::{ContextError, ScenarioContext};
pub use eventual::{PollError, PollPolicy};
pub use report::{ScenarioReport, ScenarioStatus, StepOutcome, StepStatus};
pub use scenarios::Scenario;
pub use verify::{ScenarioError, StepVerifier};

use uuid::Uuid;

/// `prefix` followed by a random UUID, for resource and alarm names.
#[must_use]
pub fn unique_name(prefix: &str) -> String {
    format!("{prefix}{}", Uuid::new_v4().simple())
}
