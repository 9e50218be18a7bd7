//! # Snapshot Storage Adapters
//!
//! Implementations of [`PersistenceStore`](crate::adapters::ports::PersistenceStore):
//!
//! - [`InMemoryStore`]: keeps the last snapshot in memory (tests, ephemeral nodes)
//! - [`FileSnapshotStore`]: bincode snapshot file, replaced atomically on save

pub mod file;
pub mod memory;

pub use file::FileSnapshotStore;
pub use memory::InMemoryStore;
