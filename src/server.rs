//! HTTP server initialization and runtime setup.
//!
//! Seeds the user directory, wires shared state, starts the rate-limiter
//! sweep and runs the Axum server until Ctrl+C.

use crate::application::services::TokenService;
use crate::config::Config;
use crate::domain::entities::User;
use crate::infrastructure::persistence::InMemoryUserRepository;
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// Password of the seed user when `ADMIN_PASSWORD_HASH` is unset.
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - In-memory user directory with the configured admin user
/// - Token service, gateway and auth service
/// - Background rate-limiter sweep
/// - Axum HTTP server with graceful shutdown
///
/// # Errors
///
/// Returns an error if:
/// - The seed password cannot be hashed
/// - State wiring fails (e.g. unsupported algorithm)
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let users = Arc::new(seed_users(&config)?);
    tracing::info!("User directory ready ({} users)", users.len());

    let state = AppState::from_config(&config, users)?;

    let sweeper = state
        .gateway
        .rate_limiter()
        .spawn_sweeper(Duration::from_secs(config.rate_limit_sweep_seconds));
    tracing::info!("Rate limiter sweep started");

    let app = app_router(state);

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("invalid LISTEN address '{}'", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    sweeper.abort();
    tracing::info!("Server stopped");

    Ok(())
}

/// Builds the directory holding the configured admin user.
fn seed_users(config: &Config) -> Result<InMemoryUserRepository> {
    let hash = match &config.admin_password_hash {
        Some(hash) => hash.clone(),
        None => {
            tracing::warn!(
                "ADMIN_PASSWORD_HASH not set; seeding '{}' with the default password",
                config.admin_username
            );
            TokenService::hash_credential(DEFAULT_ADMIN_PASSWORD)
                .context("Failed to hash default admin password")?
        }
    };

    Ok(InMemoryUserRepository::new([User::new(
        config.admin_username.clone(),
        hash,
    )]))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
