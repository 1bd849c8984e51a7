//! Domain entities.

pub mod token;
pub mod user;

pub use token::{Claims, TokenKind, TokenPair};
pub use user::User;
