//! Observability infrastructure.
//!
//! Provides:
//! - Structured tracing setup for binaries and tests
//! - OpenTelemetry metrics for increments, deliveries and discards

pub mod metrics;
pub mod tracing;
