//! The gatekeeper core.
//!
//! Everything here is plain Rust over shared, lock-protected state; the
//! axum adapter in [`crate::api::middleware::gatekeeper`] is a thin shell.
//!
//! - [`pipeline`] - ordered admit/reject checks and the [`Gateway`] context
//! - [`rate_limiter`] - per-client fixed-window counters with eviction
//! - [`metrics`](self::metrics) - aggregate counters for the monitoring endpoint
//! - [`request_log`] - structured access records
//! - [`report`] - exactly-once, fault-isolated reporting to each [`ReportSink`]
//! - [`client`] - client identity derivation
//! - [`gateway_key`] - constant-time gateway key comparison

pub mod client;
pub mod gateway_key;
pub mod metrics;
pub mod pipeline;
pub mod rate_limiter;
pub mod report;
pub mod request_log;

pub use client::{RateLimitKey, client_ip};
pub use gateway_key::{GATEWAY_KEY_HEADER, GatewayKey};
pub use self::metrics::{MetricsSink, MetricsSnapshot};
pub use pipeline::{ExcludedPaths, Gateway, bearer_token};
pub use rate_limiter::{Admission, RateLimiter};
pub use report::{CLIENT_CLOSED_REQUEST, ReportGuard, ReportSink};
pub use request_log::{ACCESS_LOG_TARGET, RequestLogger, RequestRecord, Severity};
