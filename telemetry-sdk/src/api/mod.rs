//! Telemetry API bindings.

pub mod http;
pub mod meters;
