//! Repository trait for the external user directory.

use crate::domain::entities::User;
use crate::error::AppError;
use async_trait::async_trait;

/// Read-only view of the user directory the gateway authenticates against.
///
/// Credential storage lives outside the gateway; this trait is the seam.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::InMemoryUserRepository`] - seeded in-process directory
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Looks up a user by username.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(user))` if the user exists
    /// - `Ok(None)` if no such user is known
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the directory cannot be reached.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;
}
