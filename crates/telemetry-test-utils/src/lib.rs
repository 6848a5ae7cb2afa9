//! # Telemetry Test Utilities
//!
//! Scripted in-memory collaborators for exercising the health checks
//! without a cloud deployment.
//!
//! ## Modules
//!
//! - `mock_telemetry` - Telemetry API double with per-call response scripts
//! - `mock_platform` - Platform API double that records created resources
//! - `fixtures` - Sample, statistic and configuration builders
//!
//! ## Usage
//!
//! ```rust,ignore
//! use telemetry_test_utils::*;
//!
//! #[tokio::test(start_paused = true)]
//! async fn test_example() {
//!     // `instance:create` shows up on the third poll
//!     let telemetry = MockTelemetry::new().with_sample_script(
//!         "instance:create",
//!         vec![vec![], vec![], vec![sample("inst-1", "instance:create")]],
//!     );
//!     let platform = MockPlatform::new();
//!
//!     // Build a ScenarioContext from `test_config()` and run a wait...
//! }
//! ```
//!
//! ## Scripts
//!
//! A script is a list of responses consumed one per call. When the script
//! runs out the last response repeats, so `vec![vec![], vec![s]]` means
//! "empty once, then present forever".

pub mod fixtures;
pub mod mock_platform;
pub mod mock_telemetry;

pub use fixtures::*;
pub use mock_platform::*;
pub use mock_telemetry::*;

use tracing_subscriber::EnvFilter;

/// Install a test-friendly tracing subscriber once per process.
///
/// Honors `RUST_LOG`; defaults to `telemetry=debug`. Safe to call from
/// every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("telemetry=debug")),
        )
        .with_test_writer()
        .try_init();
}
