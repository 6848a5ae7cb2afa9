//! Clients for talking to a deployed telemetry service.

pub mod ceilometer;

pub use ceilometer::CeilometerClient;
