//! Shared application state injected into handlers and middleware.

use std::sync::Arc;

use anyhow::Result;

use crate::application::services::{AuthService, TokenService};
use crate::config::Config;
use crate::domain::repositories::UserRepository;
use crate::gateway::Gateway;
use crate::infrastructure::persistence::RefreshTokenStore;

/// Everything a request needs, owned explicitly rather than held in globals.
///
/// Cloning is cheap; all members are reference-counted.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
    pub token_service: Arc<TokenService>,
    pub auth_service: Arc<AuthService<dyn UserRepository>>,
}

impl AppState {
    pub fn new(
        gateway: Arc<Gateway>,
        token_service: Arc<TokenService>,
        auth_service: Arc<AuthService<dyn UserRepository>>,
    ) -> Self {
        Self {
            gateway,
            token_service,
            auth_service,
        }
    }

    /// Wires a fresh, isolated state from configuration and a user directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the signing algorithm is invalid or the auth
    /// service cannot be initialised.
    pub fn from_config(config: &Config, users: Arc<dyn UserRepository>) -> Result<Self> {
        let token_service = Arc::new(TokenService::from_config(config)?);
        let gateway = Arc::new(Gateway::new(config, Arc::clone(&token_service)));
        let auth_service = Arc::new(AuthService::new(
            users,
            Arc::clone(&token_service),
            Arc::new(RefreshTokenStore::new()),
        )?);

        Ok(Self::new(gateway, token_service, auth_service))
    }
}
