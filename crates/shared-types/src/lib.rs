//! # Shared Types Crate
//!
//! Entities, ports and the response envelope shared by every Civic-Ledger
//! validation subsystem.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: cross-subsystem types are defined here.
//! - **Closed Hierarchies**: roles, tiers and levels are enums, never strings.
//!   String input from outer layers is parsed once at the edge.

pub mod entities;
pub mod errors;
pub mod response;
pub mod time;

pub use entities::*;
pub use errors::*;
pub use response::ApiResponse;
pub use time::{ManualTimeSource, SystemTimeSource, TimeSource};
