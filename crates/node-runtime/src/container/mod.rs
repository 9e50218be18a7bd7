//! # Subsystem Container
//!
//! Central container holding the subsystem instances with explicit
//! dependency injection.
//!
//! - Subsystems initialized in dependency order (registry first)
//! - Shared through `Arc`; no module-level singletons
//! - State committed through `checkpoint()`, after each write by default

pub mod config;
pub mod subsystems;

pub use config::{ConfigError, NodeConfig, PersistenceConfig};
pub use subsystems::SubsystemContainer;
