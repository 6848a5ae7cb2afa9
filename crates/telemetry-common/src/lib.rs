//! Common types and collaborator interfaces shared by the telemetry health checks.

#![warn(clippy::pedantic)]

/// Collaborator interfaces (telemetry and cloud platform APIs)
pub mod api;

/// Module for common configuration
pub mod config;

/// Module for collaborator error types
pub mod error;

/// Resource filters passed through to telemetry queries
pub mod query;

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for common data types
pub mod types;
