//! Adapters layer (Hexagonal Architecture)

mod event_sink;

pub use event_sink::*;
