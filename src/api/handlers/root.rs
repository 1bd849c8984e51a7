//! Public informational endpoints.

use axum::{
    Json,
    http::StatusCode,
    response::{Html, IntoResponse},
};
use serde_json::{Value, json};

use crate::error::ErrorBody;

/// `GET /`
pub async fn root_handler() -> Json<Value> {
    Json(json!({ "message": "Welcome to the API Gateway!" }))
}

/// `GET /openapi.json` - machine-readable description of the gateway.
pub async fn openapi_handler() -> Json<Value> {
    Json(json!({
        "openapi": "3.0.3",
        "info": {
            "title": "API Gateway",
            "version": env!("CARGO_PKG_VERSION"),
        },
        "components": {
            "securitySchemes": {
                "gatewayKey": { "type": "apiKey", "in": "header", "name": "X-API-GATEWAY-KEY" },
                "bearer": { "type": "http", "scheme": "bearer", "bearerFormat": "JWT" },
            }
        },
        "paths": {
            "/login": { "post": { "summary": "Exchange username/password for a token pair" } },
            "/refresh": { "post": { "summary": "Rotate a refresh token" } },
            "/monitoring": { "get": { "summary": "Aggregate request statistics" } },
            "/health": { "get": { "summary": "Liveness and component checks" } },
            "/api/v1/protected": {
                "get": {
                    "summary": "Sample protected endpoint",
                    "security": [{ "gatewayKey": [], "bearer": [] }],
                }
            },
        },
    }))
}

/// `GET /docs` and `GET /redoc` - human-readable endpoint list.
pub async fn docs_handler() -> Html<&'static str> {
    Html(concat!(
        "<!doctype html><html><head><title>API Gateway</title></head><body>",
        "<h1>API Gateway</h1>",
        "<ul>",
        "<li><code>POST /login</code> - exchange username/password for a token pair</li>",
        "<li><code>POST /refresh</code> - rotate a refresh token</li>",
        "<li><code>GET /monitoring</code> - aggregate request statistics</li>",
        "<li><code>GET /health</code> - liveness and component checks</li>",
        "<li><code>GET /api/v1/protected</code> - requires <code>X-API-GATEWAY-KEY</code> ",
        "and <code>Authorization: Bearer &lt;token&gt;</code></li>",
        "</ul>",
        "<p>Machine-readable description: <a href=\"/openapi.json\">/openapi.json</a></p>",
        "</body></html>",
    ))
}

/// `GET /favicon.ico`
pub async fn favicon_handler() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Fallback for unknown routes.
pub async fn not_found_handler() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(ErrorBody::new("Not Found")))
}
