//! Background Expiry Sweeper
//!
//! Passive expiry hides an expired key from every command, but the object
//! stays in memory until something touches the key again. A key that is set
//! with a TTL and never read would therefore live forever.
//!
//! The sweeper is a Tokio task that wakes on a fixed period (default 100ms)
//! and calls [`Store::delete_expired_keys`]. It takes the same shard locks as
//! the command handlers, one shard at a time, so a pass delays concurrent
//! commands by at most one shard scan.
//!
//! Correctness never depends on the sweeper: it only reclaims memory.

use crate::storage::Store;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

/// Default period between sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_millis(100);

/// Shortest period the sweeper accepts; smaller values are raised to this.
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

/// Configuration for the expiry sweeper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiryConfig {
    /// Period between sweeps
    pub interval: Duration,
}

impl Default for ExpiryConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

/// A handle to the running expiry sweeper.
///
/// When this handle is dropped, the sweeper task will be stopped. The server
/// keeps it alive for the whole process lifetime.
#[derive(Debug)]
pub struct ExpirySweeper {
    shutdown_tx: watch::Sender<bool>,
}

impl ExpirySweeper {
    /// Starts the expiry sweeper as a background task.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use tishkv::storage::{ExpiryConfig, ExpirySweeper, Store};
    /// use std::sync::Arc;
    ///
    /// let store = Arc::new(Store::new());
    /// let sweeper = ExpirySweeper::start(store, ExpiryConfig::default());
    ///
    /// // Dropping the handle stops the task
    /// drop(sweeper);
    /// ```
    ///
    /// An interval below [`MIN_SWEEP_INTERVAL`] is clamped up to it.
    pub fn start(store: Arc<Store>, mut config: ExpiryConfig) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        if config.interval < MIN_SWEEP_INTERVAL {
            warn!(
                requested_ms = config.interval.as_millis() as u64,
                "Sweep interval too small, using the minimum"
            );
            config.interval = MIN_SWEEP_INTERVAL;
        }

        info!(
            interval_ms = config.interval.as_millis() as u64,
            "Background expiry sweeper started"
        );

        tokio::spawn(sweeper_loop(store, config, shutdown_rx));

        Self { shutdown_tx }
    }

    /// Stops the expiry sweeper.
    ///
    /// This is called automatically when the handle is dropped.
    pub fn stop(&self) {
        if self.shutdown_tx.send(true).is_ok() {
            info!("Background expiry sweeper stopped");
        }
    }
}

impl Drop for ExpirySweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn sweeper_loop(
    store: Arc<Store>,
    config: ExpiryConfig,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // The first tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!("Expiry sweeper received shutdown signal");
                    return;
                }
            }
        }

        let expired = store.delete_expired_keys();

        if expired > 0 {
            debug!(
                expired = expired,
                keys_remaining = store.len(),
                "Expired keys cleaned up"
            );
        } else {
            trace!("Expiry sweep found nothing to reclaim");
        }
    }
}

/// Starts the expiry sweeper with the default 100ms period.
pub fn start_expiry_sweeper(store: Arc<Store>) -> ExpirySweeper {
    ExpirySweeper::start(store, ExpiryConfig::default())
}
