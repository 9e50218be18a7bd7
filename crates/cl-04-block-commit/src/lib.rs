//! # cl-04-block-commit
//!
//! Block Commit Coordinator: the proof-of-authority layer in front of the
//! ledger's commit path.
//!
//! A producer proposes a block; the coordinator hashes it, freezes the quorum
//! (`n / 2 + 1` of the active registry validators at that moment) and collects
//! signatures from active validators in parallel. A block commits only with a
//! strict majority of valid signatures.
//!
//! ```text
//! propose_block ──→ [COLLECTING] ──collect_signatures*──→ commit ──→ [COMMITTED]
//!                        │
//!                        └──────────── discard ────────────────────→ [DISCARDED]
//! ```
//!
//! Signing goes through the [`SignatureProvider`] port; the bundled
//! [`Ed25519SignatureProvider`] keeps keys in process.

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use adapters::Ed25519SignatureProvider;
pub use domain::{
    compute_block_hash, BlockProposal, CollectionReport, ProposalStatus, ValidatorSignature,
};
pub use error::{CommitError, CommitResult, SignerError};
pub use ports::SignatureProvider;
pub use service::{BlockCommitCoordinator, CommitConfig, CommitDependencies};
