//! # cl-01-validator-registry
//!
//! Validator Registry subsystem for Civic-Ledger.
//!
//! ## Overview
//!
//! Tracks every validator (identity, role, jurisdiction, active status) and
//! every member's place in the country → state → city tree. The registry is
//! the read model for eligibility checks and the source of the active
//! validator set for PoA signature collection.
//!
//! ```text
//! user registered ──→ enroll_member ──→ [GeographicIndex]
//!                                              ↑
//! register / deactivate / reactivate ──→ [ValidatorRegistry]
//!                                              │
//!              ┌───────────────────────────────┼───────────────────────┐
//!              ↓                               ↓                       ↓
//!   Eligibility Checker (3)          Consensus pools (3)      Signature fan-out (4)
//! ```
//!
//! ## Roles
//!
//! Only `representative`, `senator`, `elder` and `founder` may hold a seat;
//! `member` registrations fail with `IneligibleRole`.

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use adapters::InMemoryIdentityDirectory;
pub use domain::{GeoFilter, GeographicIndex, GeographicNode, UpsertOutcome, Validator, ValidatorStatus};
pub use error::{RegistryError, RegistryResult};
pub use ports::{IdentityDirectory, IdentityProfile};
pub use service::{RegistrySnapshot, ValidatorRegistry};
