//! Telemetry setup shared by the itemsync binaries and tests.

pub mod tracing;
