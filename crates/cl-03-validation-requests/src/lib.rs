//! # cl-03-validation-requests
//!
//! Validation Request Engine for Civic-Ledger.
//!
//! ## Overview
//!
//! A block that needs human sign-off gets a validation request. The request's
//! level fixes which tiers must attest:
//!
//! | Level | Tiers |
//! |-------|-------|
//! | basic | city |
//! | standard | city, state |
//! | secure | city, state, country |
//! | maximum | founder, city, state, country, role |
//!
//! Each submission passes the eligibility checker, is appended under the
//! request lock, and triggers a consensus evaluation. The first evaluation
//! that reaches consensus closes the request; later submissions fail with
//! `RequestClosed`.
//!
//! ## Lifecycle
//!
//! ```text
//! create ──→ [PENDING] ──submit*──→ [COMPLETED(approved|rejected)]
//!                │
//!                └── now > expires_at (lazy, on access) ──→ [EXPIRED]
//! ```

pub mod adapters;
pub mod domain;
pub mod error;
pub mod events;
pub mod metrics;
pub mod ports;
pub mod service;

pub use adapters::{InMemoryEventSink, NullEventSink};
pub use domain::{
    evaluate_eligibility, EligibilityChecker, EligibilityDecision, IneligibilityReason,
    RequestStatus, ValidationRecord, ValidationRequest,
};
pub use error::{ValidationError, ValidationResult};
pub use events::ValidationEvent;
pub use ports::EventSink;
pub use service::{
    SubmissionReceipt, TierStatus, ValidationConfig, ValidationDependencies,
    ValidationRequestEngine, ValidationStatus,
};
