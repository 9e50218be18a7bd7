//! Adapters layer (Hexagonal Architecture)

mod ed25519;

pub use ed25519::*;
