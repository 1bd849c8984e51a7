//! In-process storage backing the domain repository traits.
//!
//! The gateway keeps no durable state; these stores live for the process
//! lifetime and are injected through [`crate::state::AppState`].

mod memory_user_repository;
mod refresh_token_store;

pub use memory_user_repository::InMemoryUserRepository;
pub use refresh_token_store::RefreshTokenStore;
