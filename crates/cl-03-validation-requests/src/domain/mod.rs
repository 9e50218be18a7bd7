//! Domain layer for the Validation Request Engine
//!
//! - request: request lifecycle and records
//! - eligibility: who may attest to which tier

mod eligibility;
mod request;

pub use eligibility::*;
pub use request::*;
