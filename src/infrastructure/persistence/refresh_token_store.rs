//! Server-side record of each subject's live refresh token.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// One outstanding refresh token per subject.
///
/// Storing a new token for a subject replaces the previous one, which is
/// what makes refresh tokens single-use. [`Self::rotate`] performs the
/// compare-and-replace under the lock so concurrent refreshes with the
/// same old token cannot both win.
#[derive(Debug, Default)]
pub struct RefreshTokenStore {
    records: Mutex<HashMap<String, String>>,
}

impl RefreshTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `token` as the live refresh token for `subject`.
    pub fn replace(&self, subject: &str, token: String) {
        self.lock().insert(subject.to_owned(), token);
    }

    /// Swaps `presented` for `next` if and only if `presented` is the live
    /// token for `subject`. Returns whether the swap happened.
    pub fn rotate(&self, subject: &str, presented: &str, next: String) -> bool {
        let mut records = self.lock();
        match records.get_mut(subject) {
            Some(live) if live.as_str() == presented => {
                *live = next;
                true
            }
            _ => false,
        }
    }

    /// Live refresh token for `subject`, if any.
    pub fn current(&self, subject: &str) -> Option<String> {
        self.lock().get(subject).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
