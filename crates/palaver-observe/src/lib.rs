//! Observability setup for Palaver: structured logging and optional
//! OpenTelemetry span export.

pub mod tracing_setup;
