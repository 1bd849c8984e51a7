//! User entity as exposed by the external user directory.

/// A directory entry the gateway can authenticate against.
///
/// Only the salted password hash is ever held; the plaintext never
/// leaves the login handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub username: String,
    pub password_hash: String,
}

impl User {
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password_hash: password_hash.into(),
        }
    }
}
