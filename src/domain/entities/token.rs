//! Session token claims and token pairs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Discriminates short-lived access tokens from long-lived refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Access => f.write_str("access"),
            Self::Refresh => f.write_str("refresh"),
        }
    }
}

/// Signed payload of a session token.
///
/// `iat` and `exp` are the registered Unix timestamps in whole seconds,
/// with `exp` rounded up. `exp_ms` is the exact expiry in milliseconds and
/// is what validation compares against. `jti` is random per token so that
/// two tokens minted in the same instant still differ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub kind: TokenKind,
    pub iat: i64,
    pub exp: i64,
    pub exp_ms: i64,
    pub jti: String,
}

/// Access/refresh pair handed out on login and on refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}
