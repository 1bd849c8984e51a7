//! Structured per-request log records.

use std::time::Duration;

/// Log severity derived from a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl Severity {
    /// `>= 500` is an error, `400..=499` a warning, anything else info.
    pub fn for_status(status: u16) -> Self {
        match status {
            500.. => Self::Error,
            400..=499 => Self::Warn,
            _ => Self::Info,
        }
    }
}

/// Target of every access event, routed to the access log file.
pub const ACCESS_LOG_TARGET: &str = "apigate::access";

/// One completed request as seen by the gatekeeper.
#[derive(Debug, Clone)]
pub struct RequestRecord<'a> {
    pub method: &'a str,
    pub path: &'a str,
    pub client: &'a str,
    pub status: u16,
    pub latency: Duration,
}

/// Emits one access event per reported request on [`ACCESS_LOG_TARGET`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestLogger;

impl RequestLogger {
    pub fn new() -> Self {
        Self
    }

    pub fn log(&self, record: &RequestRecord<'_>) {
        let latency_ms = record.latency.as_secs_f64() * 1000.0;

        macro_rules! emit {
            ($level:ident) => {
                tracing::$level!(
                    target: ACCESS_LOG_TARGET,
                    method = record.method,
                    path = record.path,
                    client = record.client,
                    status = record.status,
                    latency_ms,
                    "{} {} | Status: {} | IP: {} | Time: {:.3}s",
                    record.method,
                    record.path,
                    record.status,
                    record.client,
                    record.latency.as_secs_f64(),
                )
            };
        }

        match Severity::for_status(record.status) {
            Severity::Info => emit!(info),
            Severity::Warn => emit!(warn),
            Severity::Error => emit!(error),
        }
    }
}
