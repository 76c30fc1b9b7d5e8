//! # HTTP Middleware
//!
//! Cross-cutting layers applied to every API route in [`crate::app`].

pub mod metrics;
pub mod tracing_layer;
