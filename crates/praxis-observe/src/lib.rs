//! Observability setup for Praxis: tracing subscriber with optional
//! OpenTelemetry export.

pub mod tracing_setup;

pub use tracing_setup::{filter_for_verbosity, init_tracing, shutdown_tracing};
