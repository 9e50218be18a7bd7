//! Domain layer for the Block Commit Coordinator

mod proposal;

pub use proposal::*;
