//! Client identity derivation for rate limiting and logging.

use axum::http::HeaderMap;
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::domain::entities::Claims;

/// Identity used when no peer address is known.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// What the rate limiter buckets requests by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RateLimitKey {
    /// Network address of the caller.
    #[default]
    Ip,
    /// Subject of the validated bearer token.
    Subject,
}

impl RateLimitKey {
    /// Builds the limiter key for a request that passed authentication.
    ///
    /// Subject keys are prefixed so they can never collide with an address.
    pub fn client_key(self, client_ip: &str, claims: &Claims) -> String {
        match self {
            Self::Ip => client_ip.to_owned(),
            Self::Subject => format!("sub:{}", claims.sub),
        }
    }
}

impl fmt::Display for RateLimitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ip => f.write_str("ip"),
            Self::Subject => f.write_str("subject"),
        }
    }
}

impl FromStr for RateLimitKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ip" => Ok(Self::Ip),
            "subject" | "sub" => Ok(Self::Subject),
            other => Err(format!("expected 'ip' or 'subject', got '{other}'")),
        }
    }
}

/// Resolves the caller's address.
///
/// With `behind_proxy`, the first `X-Forwarded-For` hop wins, then
/// `X-Real-IP`. Otherwise only the socket peer is trusted, since those
/// headers are client-controlled.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>, behind_proxy: bool) -> String {
    if behind_proxy {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        let real_ip = || {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        if let Some(ip) = forwarded.or_else(real_ip) {
            return ip.to_owned();
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_owned())
}
