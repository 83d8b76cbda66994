//! Periodic sweep of expired store entries.
//!
//! Reads already ignore expired counters; the sweep only bounds memory.

use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time;

use crate::observability::metrics;
use crate::store::MemoryStore;

pub struct StoreJanitor {
    store: MemoryStore,
    interval: Duration,
}

impl StoreJanitor {
    pub fn new(store: MemoryStore, interval: Duration) -> Self {
        Self { store, interval }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(interval_secs = self.interval.as_secs(), "Store janitor starting");

        let mut ticker = time::interval(self.interval);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let purged = self.store.purge_expired();
                    if purged > 0 {
                        tracing::debug!(purged, "Purged expired store entries");
                    }
                    metrics::record_store_keys(self.store.len());
                }
                _ = shutdown.recv() => {
                    tracing::info!("Store janitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
