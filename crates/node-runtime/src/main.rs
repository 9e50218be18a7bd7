//! # Civic-Ledger Node Runtime
//!
//! The main entry point for a Civic-Ledger validation node.
//!
//! ## Flow
//!
//! ```text
//! producer ──BlockNeedsCommit──→ Block Commit Coordinator (cl-04)
//!                                   │  PoA signatures from registry (cl-01)
//!                                   ↓
//!                               committed block
//!                                   │
//! policy layer ──create_validation_request──→ Validation Engine (cl-03)
//!                                   │  eligibility per tier, thresholds (cl-02)
//!                                   ↓
//!                               approved / rejected
//! ```
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (defaults + `CL_*` environment)
//! 2. Build subsystems in dependency order and restore the last snapshot
//! 3. Start the event handler and the expiry sweep
//! 4. Wait for Ctrl+C, stop background tasks, write a final checkpoint

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

use node_runtime::container::config::ENV_LOG_LEVEL;
use node_runtime::handlers::run_expiry_sweep;
use node_runtime::{NodeConfig, NodeEvent, NodeEventHandler, SubsystemContainer};

/// Capacity of the inbound event channel
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// The main node runtime orchestrating all subsystems.
pub struct NodeRuntime {
    container: Arc<SubsystemContainer>,
    /// Inbound events from the embedding process
    events_tx: broadcast::Sender<NodeEvent>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl NodeRuntime {
    /// Create a new node runtime with configuration.
    pub fn new(config: NodeConfig) -> Result<Self> {
        info!("Creating Civic-Ledger node runtime");
        let container =
            Arc::new(SubsystemContainer::new(config).context("Failed to build subsystems")?);
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            container,
            events_tx,
            shutdown_tx,
            shutdown_rx,
            tasks: Vec::new(),
        })
    }

    /// Start background tasks.
    pub fn start(&mut self) {
        info!("===========================================");
        info!("  Civic-Ledger Node Runtime v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");

        let handler = NodeEventHandler::new(Arc::clone(&self.container));
        self.tasks.push(tokio::spawn(
            handler.run(self.events_tx.subscribe(), self.shutdown_rx.clone()),
        ));

        let interval = self.container.config.sweep_interval_secs;
        if interval > 0 {
            self.tasks.push(tokio::spawn(run_expiry_sweep(
                Arc::clone(&self.container),
                Duration::from_secs(interval),
                self.shutdown_rx.clone(),
            )));
        } else {
            info!("[cl-03] Expiry sweep disabled");
        }

        info!(
            "Registry: {} validators ({} active)",
            self.container.registry.validator_count(),
            self.container.registry.active_count(None, None)
        );
        info!(
            "Validation requests pending: {}",
            self.container.validation.pending_requests().len()
        );
    }

    /// Shutdown the node gracefully.
    ///
    /// 1. Signal shutdown to all tasks
    /// 2. Wait for them to finish
    /// 3. Persist state
    pub async fn shutdown(self) -> Result<()> {
        info!("Initiating graceful shutdown...");
        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }
        for task in self.tasks {
            if let Err(e) = task.await {
                error!("Background task ended abnormally: {}", e);
            }
        }

        self.container
            .checkpoint()
            .context("Final checkpoint failed")?;
        info!("Shutdown complete");
        Ok(())
    }
}

/// Load configuration from environment.
fn load_config() -> NodeConfig {
    let mut config = NodeConfig::default();
    config.apply_overrides(|key| std::env::var(key).ok());
    config
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    info!("Log level {} (override with {})", config.log_level, ENV_LOG_LEVEL);

    let mut runtime = NodeRuntime::new(config)?;
    runtime.start();

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    runtime.shutdown().await
}
