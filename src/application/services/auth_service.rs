//! Login and refresh-token rotation.

use std::sync::Arc;

use crate::application::services::token_service::{TokenError, TokenService};
use crate::domain::entities::{TokenKind, TokenPair};
use crate::domain::repositories::UserRepository;
use crate::error::AppError;
use crate::infrastructure::persistence::RefreshTokenStore;

/// Service turning credentials into token pairs and rotating refresh tokens.
///
/// A successful login or refresh always replaces the subject's refresh
/// record, so each subject holds exactly one usable refresh token.
pub struct AuthService<R: UserRepository + ?Sized> {
    users: Arc<R>,
    tokens: Arc<TokenService>,
    refresh_tokens: Arc<RefreshTokenStore>,
    /// Verified against when the user is unknown, so both failure paths
    /// cost one hash verification.
    dummy_hash: String,
}

impl<R: UserRepository + ?Sized> AuthService<R> {
    /// Creates a new authentication service.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Hashing`] if the placeholder hash cannot be built.
    pub fn new(
        users: Arc<R>,
        tokens: Arc<TokenService>,
        refresh_tokens: Arc<RefreshTokenStore>,
    ) -> Result<Self, TokenError> {
        Ok(Self {
            users,
            tokens,
            refresh_tokens,
            dummy_hash: TokenService::hash_credential("apigate-placeholder")?,
        })
    }

    /// Exchanges a username and password for a fresh token pair.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidCredentials`] for an unknown user or a
    /// wrong password alike. Returns [`AppError::Internal`] if the
    /// directory or token signing fails.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair, AppError> {
        let user = self.users.find_by_username(username).await?;

        let (hash, known) = match &user {
            Some(user) => (user.password_hash.clone(), true),
            None => (self.dummy_hash.clone(), false),
        };

        let password = password.to_owned();
        let verified = tokio::task::spawn_blocking(move || {
            TokenService::verify_credential(&password, &hash)
        })
        .await
        .map_err(|e| AppError::internal(format!("credential check aborted: {e}")))?;

        if !(known && verified) {
            tracing::info!("login rejected");
            return Err(AppError::InvalidCredentials);
        }

        let pair = self.issue_pair(username)?;
        self.refresh_tokens
            .replace(username, pair.refresh_token.clone());

        tracing::info!(subject = %username, "login succeeded");
        Ok(pair)
    }

    /// Rotates a refresh token: the presented token is consumed and a new
    /// pair is returned.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidRefreshToken`] if the token does not
    /// validate, is not a refresh token, or is no longer the subject's live
    /// refresh token. No tokens are handed out in that case.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AppError> {
        let claims = self
            .tokens
            .validate_kind(refresh_token, TokenKind::Refresh)
            .map_err(|reason| {
                tracing::info!(%reason, "refresh rejected");
                AppError::InvalidRefreshToken
            })?;

        let pair = self.issue_pair(&claims.sub)?;

        if !self
            .refresh_tokens
            .rotate(&claims.sub, refresh_token, pair.refresh_token.clone())
        {
            tracing::warn!(subject = %claims.sub, "stale refresh token presented");
            return Err(AppError::InvalidRefreshToken);
        }

        tracing::info!(subject = %claims.sub, "refresh token rotated");
        Ok(pair)
    }

    fn issue_pair(&self, subject: &str) -> Result<TokenPair, AppError> {
        Ok(TokenPair {
            access_token: self.tokens.issue_kind(subject, TokenKind::Access)?,
            refresh_token: self.tokens.issue_kind(subject, TokenKind::Refresh)?,
        })
    }
}
