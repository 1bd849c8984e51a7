//! DTOs for the monitoring endpoint.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::gateway::MetricsSnapshot;

/// Aggregate request statistics.
///
/// `status_counts` keys serialize as strings (`"200"`), as JSON requires.
#[derive(Debug, Serialize)]
pub struct MonitoringResponse {
    pub total_requests: u64,
    pub status_counts: BTreeMap<u16, u64>,
    /// Human-readable mean latency, e.g. `"0.012 seconds"`.
    pub average_response_time: String,
    pub average_response_time_seconds: f64,
    /// Clients with an open rate-limit window.
    pub tracked_clients: usize,
}

impl MonitoringResponse {
    pub fn new(snapshot: MetricsSnapshot, tracked_clients: usize) -> Self {
        Self {
            total_requests: snapshot.total_requests,
            status_counts: snapshot.status_counts,
            average_response_time: format!("{:.3} seconds", snapshot.average_response_time),
            average_response_time_seconds: snapshot.average_response_time,
            tracked_clients,
        }
    }
}
