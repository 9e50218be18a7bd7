//! # Node Runtime Library
//!
//! This library exposes the internal modules of the node runtime for testing.
//! The main entry point is the `main.rs` binary.
//!
//! ## Architectural Patterns
//!
//! - **Hexagonal Architecture**: Ports define contracts, Adapters implement them
//! - **Explicit wiring**: every subsystem is built once in the container and
//!   shared through `Arc`
//! - **Checkpointed writes**: every successful mutation ends in a checkpoint
//!   of keys and state unless `checkpoint_on_write` is off

#![allow(clippy::type_complexity)]

pub mod adapters;
pub mod api;
pub mod container;
pub mod handlers;

pub use api::CivicValidationApi;
pub use container::{NodeConfig, SubsystemContainer};
pub use handlers::{BlockCommitOutcome, EnrollmentOutcome, NodeEvent, NodeEventHandler};
