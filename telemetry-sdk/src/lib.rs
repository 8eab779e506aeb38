//! Client binding for the telemetry **meters** API.
//!
//! - [`api::http`] contains the service client abstraction and its HTTP implementation.
//! - [`api::meters`] builds meter list and statistics requests.

pub mod api;
