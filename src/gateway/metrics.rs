//! Process-wide request metrics.
//!
//! All three aggregates live behind a single mutex and are updated together,
//! so `total_requests` always equals the sum of `status_counts` and a
//! snapshot never observes a half-applied sample.
//!
//! Every sample is also forwarded to the [`metrics`] facade. Without an
//! installed recorder that forwarding is a no-op.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;

/// Point-in-time copy of the aggregates.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub status_counts: BTreeMap<u16, u64>,
    /// Cumulative mean latency in seconds.
    pub average_response_time: f64,
}

/// Accumulates request outcomes for the monitoring endpoint.
#[derive(Debug, Default)]
pub struct MetricsSink {
    state: Mutex<MetricsSnapshot>,
}

impl MetricsSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one completed request.
    pub fn record(&self, status: u16, latency: Duration) {
        let seconds = latency.as_secs_f64();

        {
            let mut state = self.lock();
            state.total_requests += 1;
            *state.status_counts.entry(status).or_insert(0) += 1;
            // Incremental form of the cumulative mean.
            let n = state.total_requests as f64;
            state.average_response_time += (seconds - state.average_response_time) / n;
        }

        metrics::counter!("gateway_requests_total", "status" => status.to_string()).increment(1);
        metrics::histogram!("gateway_request_duration_seconds").record(seconds);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, MetricsSnapshot> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
