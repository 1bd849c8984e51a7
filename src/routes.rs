//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /`, `/docs`, `/redoc`, `/openapi.json`, `/favicon.ico` - informational (excluded)
//! - `POST /login`, `/refresh`  - token issuance (excluded)
//! - `GET  /monitoring`         - metrics snapshot (always excluded)
//! - `GET  /health`             - component health (excluded)
//! - `/api/*`                   - gated routes
//!
//! # Middleware (outermost first)
//!
//! - **Path normalization** - trailing slash trimmed before routing and exclusion matching
//! - **Tracing** - HTTP request/response spans
//! - **Gatekeeper** - gateway key, bearer token, rate limit, metrics and access log
//! - **Panic recovery** - handler panics become a JSON 500 the gatekeeper still records

use crate::api;
use crate::api::handlers::not_found_handler;
use crate::api::middleware::{gatekeeper, panic, tracing};
use crate::state::AppState;
use axum::{Router, middleware};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Builds the gateway router without path normalization.
///
/// Useful in tests that drive the router directly; production uses
/// [`app_router`].
pub fn gateway_router(state: AppState) -> Router {
    let routes = Router::new()
        .merge(api::routes::public_routes())
        .nest("/api", api::routes::protected_routes());

    with_gateway(routes, state)
}

/// Wraps `routes` in the gatekeeper, panic recovery and tracing layers
/// and attaches the 404 fallback.
pub fn with_gateway(routes: Router<AppState>, state: AppState) -> Router {
    routes
        .fallback(not_found_handler)
        .layer(panic::layer())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            gatekeeper::layer,
        ))
        .with_state(state)
        .layer(tracing::layer())
}

/// Constructs the application router with all routes and middleware.
///
/// # Arguments
///
/// - `state` - shared application state injected into all handlers
pub fn app_router(state: AppState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(gateway_router(state))
}
