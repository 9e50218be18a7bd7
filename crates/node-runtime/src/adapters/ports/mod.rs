//! # Ports Consumed by the Node
//!
//! Contracts for capabilities injected into the runtime. Implementations live
//! under `adapters/`.

pub mod persistence;

pub use persistence::*;
