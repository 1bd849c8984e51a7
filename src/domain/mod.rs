//! Domain layer: entities and repository contracts.
//!
//! Nothing in this layer knows about HTTP. The gateway core and the
//! application services build on these types.

pub mod entities;
pub mod repositories;
