//! DTOs for the login and refresh endpoints.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::entities::TokenPair;

/// OAuth2 password-grant form body for `POST /login`.
///
/// Other OAuth2 form fields (`grant_type`, `scope`, ...) are accepted and
/// ignored.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 128, message = "username must be 1-128 characters"))]
    pub username: String,

    #[validate(length(min = 1, max = 1024, message = "password must be 1-1024 characters"))]
    pub password: String,
}

/// JSON body for `POST /refresh`.
#[derive(Debug, Deserialize, Validate)]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "refresh_token must not be empty"))]
    pub refresh_token: String,
}

/// Token pair returned on successful login or refresh.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

impl From<TokenPair> for TokenResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: "bearer".to_string(),
        }
    }
}
