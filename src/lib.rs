//! # apigate
//!
//! An API gateway layer built with Axum. Every request that is not on the
//! excluded-path list must carry the shared gateway key and a valid bearer
//! access token, and is subject to a per-client fixed-window rate limit.
//!
//! ## Architecture
//!
//! - **Domain Layer** ([`domain`]) - Users, token claims and the user directory contract
//! - **Application Layer** ([`application`]) - Token issuance/validation, login and refresh rotation
//! - **Gateway Core** ([`gateway`]) - Ordered admission checks, rate limiter, metrics and access log
//! - **Infrastructure Layer** ([`infrastructure`]) - In-process user directory and refresh-token store
//! - **API Layer** ([`api`]) - Handlers, DTOs and middleware
//!
//! ## Quick Start
//!
//! ```bash
//! export API_GATEWAY_KEY="change-me"
//! export SECRET_KEY="a-long-random-value"
//! cargo run
//!
//! curl -X POST -d 'username=admin&password=admin123' localhost:8000/login
//! curl -H 'X-API-GATEWAY-KEY: change-me' -H "Authorization: Bearer $TOKEN" \
//!     localhost:8000/api/v1/protected
//! ```
//!
//! ## Configuration
//!
//! Service configuration is loaded from environment variables via [`config::Config`].
//! See [`config`] module for available options.

pub mod api;
pub mod application;
pub mod domain;
pub mod error;
pub mod gateway;
pub mod infrastructure;
pub mod state;

pub mod config;
pub mod server;
pub mod telemetry;

pub mod routes;

pub use error::{AppError, GatewayRejection};
pub use state::AppState;

/// Commonly used types for external consumers.
///
/// Re-exports frequently used types to simplify imports for library users
/// and integration tests.
pub mod prelude {
    pub use crate::application::services::{AuthService, TokenService};
    pub use crate::config::Config;
    pub use crate::domain::entities::{Claims, TokenKind, TokenPair, User};
    pub use crate::error::{AppError, GatewayRejection};
    pub use crate::gateway::{Gateway, MetricsSnapshot};
    pub use crate::infrastructure::persistence::InMemoryUserRepository;
    pub use crate::state::AppState;
}
