//! Handler for the monitoring endpoint.

use axum::{Json, extract::State};

use crate::api::dto::monitoring::MonitoringResponse;
use crate::state::AppState;

/// Returns aggregate request statistics.
///
/// # Endpoint
///
/// `GET /monitoring`
///
/// This path is always excluded from the gatekeeper so reading metrics
/// never changes them.
///
/// # Response
///
/// ```json
/// {
///   "total_requests": 6,
///   "status_counts": { "200": 3, "429": 3 },
///   "average_response_time": "0.002 seconds",
///   "average_response_time_seconds": 0.0021,
///   "tracked_clients": 1
/// }
/// ```
pub async fn monitoring_handler(State(state): State<AppState>) -> Json<MonitoringResponse> {
    let snapshot = state.gateway.metrics().snapshot();
    let tracked = state.gateway.rate_limiter().tracked_clients();

    Json(MonitoringResponse::new(snapshot, tracked))
}
