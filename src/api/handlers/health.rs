//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::domain::entities::TokenKind;
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: All components healthy
/// - **503 Service Unavailable**: One or more components degraded
///
/// # Components Checked
///
/// 1. **Token service**: Signs and validates a short-lived self-check token
/// 2. **Rate limiter**: Reports the number of tracked clients
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let token_check = check_token_service(&state);
    let limiter_check = check_rate_limiter(&state);

    let all_healthy = token_check.status == "ok" && limiter_check.status == "ok";

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            token_service: token_check,
            rate_limiter: limiter_check,
        },
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

/// Round-trips a self-check token through the token service.
fn check_token_service(state: &AppState) -> CheckStatus {
    let check = state
        .token_service
        .issue("health-check", TokenKind::Access, chrono::Duration::seconds(30))
        .map_err(|e| e.to_string())
        .and_then(|token| {
            state
                .token_service
                .validate(&token)
                .map_err(|e| e.to_string())
        });

    match check {
        Ok(_) => CheckStatus {
            status: "ok".to_string(),
            message: None,
        },
        Err(e) => CheckStatus {
            status: "error".to_string(),
            message: Some(format!("Token round-trip failed: {}", e)),
        },
    }
}

/// Reports rate limiter occupancy.
fn check_rate_limiter(state: &AppState) -> CheckStatus {
    let limiter = state.gateway.rate_limiter();
    CheckStatus {
        status: "ok".to_string(),
        message: Some(format!(
            "Tracking {} clients, limit {} per {}s",
            limiter.tracked_clients(),
            limiter.limit(),
            limiter.window().as_secs()
        )),
    }
}
