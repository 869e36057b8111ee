//! Observability setup for vectable: structured logging with an optional
//! OpenTelemetry span exporter.

pub mod tracing_setup;

pub use tracing_setup::{LogFormat, TracingOptions, init_tracing, shutdown_tracing};
