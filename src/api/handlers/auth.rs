//! Handlers for token issuance and rotation.

use axum::{
    Form, Json,
    extract::{
        State,
        rejection::{FormRejection, JsonRejection},
    },
};
use validator::Validate;

use crate::api::dto::auth::{LoginRequest, RefreshRequest, TokenResponse};
use crate::error::AppError;
use crate::state::AppState;

/// Exchanges username/password for a token pair.
///
/// # Endpoint
///
/// `POST /login` (`application/x-www-form-urlencoded`)
///
/// # Request Body
///
/// ```text
/// username=admin&password=admin123
/// ```
///
/// # Response
///
/// ```json
/// {
///   "access_token": "eyJ...",
///   "refresh_token": "eyJ...",
///   "token_type": "bearer"
/// }
/// ```
///
/// # Errors
///
/// Returns 400 Bad Request with `"Invalid username or password"` for an
/// unknown user or a wrong password, and 400 for a malformed form.
pub async fn login_handler(
    State(state): State<AppState>,
    payload: Result<Form<LoginRequest>, FormRejection>,
) -> Result<Json<TokenResponse>, AppError> {
    let Form(payload) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    payload.validate()?;

    let pair = state
        .auth_service
        .login(&payload.username, &payload.password)
        .await?;

    Ok(Json(pair.into()))
}

/// Rotates a refresh token into a new token pair.
///
/// # Endpoint
///
/// `POST /refresh`
///
/// # Request Body
///
/// ```json
/// { "refresh_token": "eyJ..." }
/// ```
///
/// # Errors
///
/// Returns 401 Unauthorized with `"Invalid or expired refresh token"` if
/// the token does not validate or has already been used.
pub async fn refresh_handler(
    State(state): State<AppState>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, AppError> {
    let Json(payload) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    payload.validate()?;

    let pair = state.auth_service.refresh(&payload.refresh_token).await?;

    Ok(Json(pair.into()))
}
