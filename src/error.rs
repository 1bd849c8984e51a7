//! Error types and their HTTP rendering.
//!
//! Every rejection the gateway produces is rendered as
//! `{"detail": "<message>"}` with the matching status code. Internal
//! details are logged and never sent to the client.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::WWW_AUTHENTICATE},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::application::services::TokenError;

/// JSON body shared by every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl ErrorBody {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

/// Errors raised by the login/refresh endpoints and the services behind them.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Unknown user and wrong password are deliberately indistinguishable.
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Invalid or expired refresh token")]
    InvalidRefreshToken,

    #[error("{0}")]
    Validation(String),

    /// The payload is logged; the client only sees a generic message.
    #[error("Internal Server Error")]
    Internal(String),
}

impl AppError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidCredentials | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRefreshToken => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        Self::internal(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Self::Internal(ref message) = self {
            tracing::error!(error = %message, "request failed with internal error");
        }

        let status = self.status();
        let mut response = (status, Json(ErrorBody::new(self.to_string()))).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

/// Outcome of a failed gatekeeper check.
///
/// Each variant maps to exactly one status code; forbidden (gateway key)
/// is never conflated with unauthenticated (bearer token).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GatewayRejection {
    #[error("Invalid API Gateway Key")]
    Forbidden,

    /// No `Authorization` header, or a scheme other than `Bearer`.
    #[error("Missing or invalid token")]
    MissingToken,

    /// A bearer token was presented but did not validate.
    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Too many requests")]
    RateLimited,

    #[error("Internal Server Error in Middleware")]
    Internal,
}

impl GatewayRejection {
    pub fn status(self) -> StatusCode {
        match self {
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::MissingToken | Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayRejection {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut response = (status, Json(ErrorBody::new(self.to_string()))).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_status_codes() {
        assert_eq!(GatewayRejection::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            GatewayRejection::MissingToken.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            GatewayRejection::InvalidToken.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            GatewayRejection::RateLimited.status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            GatewayRejection::Internal.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_unauthorized_carries_challenge_header() {
        let response = GatewayRejection::InvalidToken.into_response();
        assert_eq!(
            response.headers().get(WWW_AUTHENTICATE).unwrap(),
            &HeaderValue::from_static("Bearer")
        );

        let response = GatewayRejection::Forbidden.into_response();
        assert!(response.headers().get(WWW_AUTHENTICATE).is_none());
    }

    #[test]
    fn test_internal_error_hides_details() {
        let err = AppError::internal("argon2 blew up: bad params");
        assert_eq!(err.to_string(), "Internal Server Error");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_login_failure_is_bad_request() {
        assert_eq!(
            AppError::InvalidCredentials.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::InvalidRefreshToken.status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
