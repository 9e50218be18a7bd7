//! # Validation Metrics
//!
//! Prometheus metrics for monitoring tiered validation.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! cl-03-validation-requests = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `validation_requests_created_total` - Counter of created requests
//! - `validation_records_accepted_total` - Counter of accepted records (by tier)
//! - `validation_records_rejected_total` - Counter of rejected submissions (by reason)
//! - `validation_consensus_total` - Counter of decided requests (by result)
//! - `validation_requests_expired_total` - Counter of expired requests

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_counter_vec, register_int_counter, CounterVec, IntCounter};

#[cfg(feature = "metrics")]
lazy_static! {
    pub static ref REQUESTS_CREATED: IntCounter = register_int_counter!(
        "validation_requests_created_total",
        "Total number of validation requests created"
    )
    .expect("Failed to create REQUESTS_CREATED metric");

    pub static ref RECORDS_ACCEPTED: CounterVec = register_counter_vec!(
        "validation_records_accepted_total",
        "Total number of validation records accepted",
        &["tier"]
    )
    .expect("Failed to create RECORDS_ACCEPTED metric");

    pub static ref RECORDS_REJECTED: CounterVec = register_counter_vec!(
        "validation_records_rejected_total",
        "Total number of validation submissions rejected",
        &["reason"]
    )
    .expect("Failed to create RECORDS_REJECTED metric");

    pub static ref CONSENSUS_OUTCOMES: CounterVec = register_counter_vec!(
        "validation_consensus_total",
        "Total number of requests that reached consensus",
        &["result"]
    )
    .expect("Failed to create CONSENSUS_OUTCOMES metric");

    pub static ref REQUESTS_EXPIRED: IntCounter = register_int_counter!(
        "validation_requests_expired_total",
        "Total number of validation requests expired"
    )
    .expect("Failed to create REQUESTS_EXPIRED metric");
}

#[cfg(feature = "metrics")]
pub fn record_request_created() {
    REQUESTS_CREATED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_accepted(tier: &str) {
    RECORDS_ACCEPTED.with_label_values(&[tier]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_rejected(reason: &str) {
    RECORDS_REJECTED.with_label_values(&[reason]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_consensus(result: &str) {
    CONSENSUS_OUTCOMES.with_label_values(&[result]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_expired() {
    REQUESTS_EXPIRED.inc();
}

// No-op implementations when metrics feature is disabled
#[cfg(not(feature = "metrics"))]
pub fn record_request_created() {}

#[cfg(not(feature = "metrics"))]
pub fn record_accepted(_tier: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_rejected(_reason: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_consensus(_result: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_expired() {}
