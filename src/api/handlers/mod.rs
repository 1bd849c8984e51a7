//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod auth;
pub mod health;
pub mod monitoring;
pub mod protected;
pub mod root;

pub use auth::{login_handler, refresh_handler};
pub use health::health_handler;
pub use monitoring::monitoring_handler;
pub use protected::protected_handler;
pub use root::{
    docs_handler, favicon_handler, not_found_handler, openapi_handler, root_handler,
};
