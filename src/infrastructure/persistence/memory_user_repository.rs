//! In-process user directory.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::domain::entities::User;
use crate::domain::repositories::UserRepository;
use crate::error::AppError;

/// Read-only user directory held in memory.
///
/// Stands in for an external directory; it is populated once at startup
/// and never mutated afterwards.
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserRepository {
    users: HashMap<String, User>,
}

impl InMemoryUserRepository {
    pub fn new(users: impl IntoIterator<Item = User>) -> Self {
        Self {
            users: users
                .into_iter()
                .map(|user| (user.username.clone(), user))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.get(username).cloned())
    }
}
