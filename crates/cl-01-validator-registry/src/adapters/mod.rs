//! Adapters layer (Hexagonal Architecture)

mod directory;

pub use directory::*;
