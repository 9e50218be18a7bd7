//! Cross-subsystem integration scenarios

pub mod block_commit_flow;
pub mod node_lifecycle;
pub mod validation_flow;
