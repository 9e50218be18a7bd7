//! # Event Handlers
//!
//! - `choreography`: inbound user-registered / block-needs-commit events
//! - `sweep`: periodic expiry of validation requests

pub mod choreography;
pub mod sweep;

pub use choreography::*;
pub use sweep::run_expiry_sweep;
