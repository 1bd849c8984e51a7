//! The gatekeeper checks, in order.
//!
//! 1. excluded path: bypass everything, including reporting
//! 2. gateway key: `403` on mismatch
//! 3. bearer token: `401` if missing, malformed, invalid or expired
//! 4. rate limit: `429` when the client's window is exhausted
//!
//! The first failing check decides the outcome. The HTTP adapter lives in
//! [`crate::api::middleware::gatekeeper`].

use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderMap, header::AUTHORIZATION};

use crate::application::services::TokenService;
use crate::config::{Config, MONITORING_PATH};
use crate::domain::entities::{Claims, TokenKind};
use crate::error::GatewayRejection;
use crate::gateway::client::RateLimitKey;
use crate::gateway::gateway_key::{GATEWAY_KEY_HEADER, GatewayKey};
use crate::gateway::metrics::MetricsSink;
use crate::gateway::rate_limiter::{Admission, RateLimiter};
use crate::gateway::report::{ReportGuard, ReportSink};
use crate::gateway::request_log::RequestLogger;

/// Exact-match set of paths exempt from every check.
#[derive(Debug, Clone)]
pub struct ExcludedPaths(HashSet<String>);

impl ExcludedPaths {
    /// Builds the set. The monitoring path is always included.
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set: HashSet<String> = paths.into_iter().map(Into::into).collect();
        set.insert(MONITORING_PATH.to_owned());
        Self(set)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.0.contains(path)
    }
}

/// Extracts the token from `Authorization: Bearer <token>`.
///
/// The scheme is matched case-sensitively. Any other scheme, or a header
/// that is not valid ASCII, yields `None`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Shared state of the gatekeeper pipeline.
///
/// One instance per process, injected through [`crate::state::AppState`];
/// tests build isolated instances.
pub struct Gateway {
    gateway_key: GatewayKey,
    excluded_paths: ExcludedPaths,
    tokens: Arc<TokenService>,
    rate_limiter: Arc<RateLimiter>,
    rate_limit_key: RateLimitKey,
    behind_proxy: bool,
    metrics: MetricsSink,
    logger: RequestLogger,
    extra_sinks: Vec<Arc<dyn ReportSink>>,
}

impl Gateway {
    pub fn new(config: &Config, tokens: Arc<TokenService>) -> Self {
        Self {
            gateway_key: GatewayKey::new(&config.gateway_key),
            excluded_paths: ExcludedPaths::new(config.excluded_paths.iter().cloned()),
            tokens,
            rate_limiter: Arc::new(RateLimiter::new(
                config.rate_limit,
                Duration::from_secs(config.rate_limit_window_seconds),
            )),
            rate_limit_key: config.rate_limit_key,
            behind_proxy: config.behind_proxy,
            metrics: MetricsSink::new(),
            logger: RequestLogger::new(),
            extra_sinks: Vec::new(),
        }
    }

    /// Adds a sink that receives every reported request after the metrics
    /// sink and the access logger.
    pub fn with_sink(mut self, sink: Arc<dyn ReportSink>) -> Self {
        self.extra_sinks.push(sink);
        self
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.excluded_paths.contains(path)
    }

    pub fn behind_proxy(&self) -> bool {
        self.behind_proxy
    }

    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.rate_limiter
    }

    pub fn metrics(&self) -> &MetricsSink {
        &self.metrics
    }

    pub fn logger(&self) -> &RequestLogger {
        &self.logger
    }

    /// All sinks in reporting order.
    pub fn sinks(&self) -> impl Iterator<Item = &dyn ReportSink> + '_ {
        let builtin: [&dyn ReportSink; 2] = [&self.metrics, &self.logger];
        let extra = self
            .extra_sinks
            .iter()
            .map(|sink| &**sink as &dyn ReportSink);
        builtin.into_iter().chain(extra)
    }

    /// Runs checks 2-4 for a non-excluded request.
    ///
    /// On success, returns the validated access-token claims.
    pub fn check(&self, headers: &HeaderMap, client_ip: &str) -> Result<Claims, GatewayRejection> {
        let presented = headers.get(GATEWAY_KEY_HEADER).map(|v| v.as_bytes());
        if !self.gateway_key.matches(presented) {
            tracing::debug!(client = client_ip, "gateway key mismatch");
            return Err(GatewayRejection::Forbidden);
        }

        let token = bearer_token(headers).ok_or(GatewayRejection::MissingToken)?;

        let claims = self
            .tokens
            .validate_kind(token, TokenKind::Access)
            .map_err(|reason| {
                tracing::debug!(client = client_ip, %reason, "bearer token rejected");
                GatewayRejection::InvalidToken
            })?;

        let client_key = self.rate_limit_key.client_key(client_ip, &claims);
        match self.rate_limiter.admit(&client_key) {
            Admission::Allow => Ok(claims),
            Admission::Deny => {
                tracing::warn!(client = %client_key, "rate limit exceeded");
                Err(GatewayRejection::RateLimited)
            }
        }
    }

    /// [`Self::check`] with any panic converted into
    /// [`GatewayRejection::Internal`].
    pub fn check_guarded(
        &self,
        headers: &HeaderMap,
        client_ip: &str,
    ) -> Result<Claims, GatewayRejection> {
        contain_fault(client_ip, || self.check(headers, client_ip))
    }

    /// Starts timing a request; the returned guard reports it exactly once.
    pub fn begin_report(self: &Arc<Self>, method: &str, path: &str, client: &str) -> ReportGuard {
        ReportGuard::new(Arc::clone(self), method, path, client)
    }
}

/// Runs a gatekeeper step, turning a panic into
/// [`GatewayRejection::Internal`].
pub(crate) fn contain_fault<T>(
    client_ip: &str,
    step: impl FnOnce() -> Result<T, GatewayRejection>,
) -> Result<T, GatewayRejection> {
    panic::catch_unwind(AssertUnwindSafe(step)).unwrap_or_else(|_| {
        tracing::error!(client = client_ip, "gatekeeper check panicked");
        Err(GatewayRejection::Internal)
    })
}
