//! Periodic expiry sweep
//!
//! Expiry is already applied lazily on access; the sweep closes requests that
//! nobody touches so status reports and the audit stream stay current. A pass
//! that expires anything is checkpointed.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info};

use crate::container::SubsystemContainer;

/// Run `sweep_expired` every `interval` until shutdown.
pub async fn run_expiry_sweep(
    container: Arc<SubsystemContainer>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    info!("[cl-03] Expiry sweep every {:?}", interval);
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // First tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                info!("[cl-03] Expiry sweep stopped");
                break;
            }
            _ = ticker.tick() => {
                let expired = container.validation.sweep_expired();
                debug!("[cl-03] Sweep pass expired {} requests", expired.len());
                if !expired.is_empty() {
                    container.persist_change("expiry_sweep");
                }
            }
        }
    }
}
