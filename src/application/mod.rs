//! Application layer services implementing the authentication flows.
//!
//! # Available Services
//!
//! - [`services::token_service::TokenService`] - Token issuance/validation and credential hashing
//! - [`services::auth_service::AuthService`] - Login and refresh-token rotation

pub mod services;
