//! Domain layer for the Consensus Calculator
//!
//! - thresholds: per-tier minimums, approval percentages and windows
//! - tiered: multi-tier consensus for validation requests (floor rounding)
//! - majority: strict-majority quorum for PoA block signatures

mod majority;
mod thresholds;
mod tiered;

pub use majority::*;
pub use thresholds::*;
pub use tiered::*;
