//! HTTP middleware for request processing and protection.
//!
//! Provides the gatekeeper, panic recovery and request tracing.

pub mod gatekeeper;
pub mod panic;
pub mod tracing;
