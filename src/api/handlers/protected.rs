//! Sample endpoint behind the gatekeeper.

use axum::{Json, extract::Request};
use serde_json::{Value, json};

use crate::domain::entities::Claims;

/// Confirms the caller passed every gatekeeper check.
///
/// # Endpoint
///
/// `GET /api/v1/protected`
///
/// Requires `X-API-GATEWAY-KEY` and `Authorization: Bearer <access token>`.
pub async fn protected_handler(req: Request) -> Json<Value> {
    let subject = req.extensions().get::<Claims>().map(|c| c.sub.clone());

    Json(json!({
        "message": "Access granted to protected endpoint",
        "subject": subject,
    }))
}
