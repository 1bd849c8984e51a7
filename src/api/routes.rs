//! API route configuration.
//!
//! Routes here carry no authentication of their own; the gatekeeper in
//! [`crate::api::middleware::gatekeeper`] decides per path whether a
//! request is checked.

use crate::api::handlers::{
    docs_handler, favicon_handler, health_handler, login_handler, monitoring_handler,
    openapi_handler, protected_handler, refresh_handler, root_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// Routes excluded from the gatekeeper by default.
///
/// # Endpoints
///
/// - `GET  /`              - Welcome message
/// - `GET  /docs`          - Endpoint overview (HTML)
/// - `GET  /redoc`         - Same overview
/// - `GET  /openapi.json`  - Machine-readable API description
/// - `GET  /favicon.ico`   - Empty response
/// - `POST /login`         - Exchange username/password for a token pair
/// - `POST /refresh`       - Rotate a refresh token
/// - `GET  /monitoring`    - Aggregate request statistics
/// - `GET  /health`        - Component health
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root_handler))
        .route("/docs", get(docs_handler))
        .route("/redoc", get(docs_handler))
        .route("/openapi.json", get(openapi_handler))
        .route("/favicon.ico", get(favicon_handler))
        .route("/login", post(login_handler))
        .route("/refresh", post(refresh_handler))
        .route("/monitoring", get(monitoring_handler))
        .route("/health", get(health_handler))
}

/// Routes that pass every gatekeeper check, nested under `/api`.
///
/// # Endpoints
///
/// - `GET /v1/protected` - Confirms access and echoes the token subject
pub fn protected_routes() -> Router<AppState> {
    Router::new().route("/v1/protected", get(protected_handler))
}
