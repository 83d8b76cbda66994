//! Per-address checkout attempt counter.
//!
//! Every increment rewrites the entry with a fresh expiry, so the window
//! slides with each attempt instead of starting once at the first one.

use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;

use crate::store::{read_count, KeyValueStore};

const KEY_PREFIX: &str = "ip_block_count_";

/// Store key for an address. Hashing keeps arbitrary header text out of the key space.
pub fn counter_key(address: &str) -> String {
    let digest = Sha256::digest(address.as_bytes());
    format!("{}{}", KEY_PREFIX, hex::encode(digest))
}

#[derive(Clone)]
pub struct AttemptCounter {
    store: Arc<dyn KeyValueStore>,
    window: Duration,
}

impl AttemptCounter {
    pub fn new(store: Arc<dyn KeyValueStore>, window: Duration) -> Self {
        Self { store, window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Count one more attempt and restart the window. Returns the new count.
    pub fn increment(&self, address: &str) -> u64 {
        self.store.increment(&counter_key(address), self.window)
    }

    /// Attempts recorded in the current window, 0 when absent or expired.
    pub fn get_count(&self, address: &str) -> u64 {
        self.store
            .get(&counter_key(address))
            .as_ref()
            .map(read_count)
            .unwrap_or(0)
    }

    /// Forget the address immediately.
    pub fn reset(&self, address: &str) {
        if self.store.delete(&counter_key(address)) {
            tracing::info!(client = %address, "Attempt counter reset");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ManualClock, MemoryStore};

    fn counter(window: Duration) -> AttemptCounter {
        AttemptCounter::new(Arc::new(MemoryStore::new(None)), window)
    }

    fn manual_counter(window: Duration) -> (AttemptCounter, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::starting_now());
        let store = MemoryStore::with_clock(None, clock.clone());
        (AttemptCounter::new(Arc::new(store), window), clock)
    }

    #[test]
    fn test_unknown_address_is_zero() {
        let c = counter(Duration::from_secs(3600));
        assert_eq!(c.get_count("1.2.3.4"), 0);
    }

    #[test]
    fn test_increment_accumulates() {
        let c = counter(Duration::from_secs(3600));
        for n in 1..=4 {
            assert_eq!(c.increment("1.2.3.4"), n);
        }
        assert_eq!(c.get_count("1.2.3.4"), 4);
        assert_eq!(c.get_count("5.6.7.8"), 0);
    }

    #[test]
    fn test_reset() {
        let c = counter(Duration::from_secs(3600));
        c.increment("1.2.3.4");
        c.increment("1.2.3.4");
        c.reset("1.2.3.4");
        assert_eq!(c.get_count("1.2.3.4"), 0);
        // Resetting an unknown address is harmless.
        c.reset("9.9.9.9");
    }

    #[test]
    fn test_window_expiry() {
        let (c, clock) = manual_counter(Duration::from_secs(3600));
        c.increment("1.2.3.4");
        clock.advance(Duration::from_secs(3600));
        assert_eq!(c.get_count("1.2.3.4"), 0);
        assert_eq!(c.increment("1.2.3.4"), 1);
    }

    #[test]
    fn test_window_slides_on_increment() {
        let (c, clock) = manual_counter(Duration::from_secs(3600));
        c.increment("1.2.3.4");
        clock.advance(Duration::from_secs(3000));
        c.increment("1.2.3.4");
        clock.advance(Duration::from_secs(3000));
        // 6000s after the first attempt but only 3000s after the last one.
        assert_eq!(c.get_count("1.2.3.4"), 2);
    }

    #[test]
    fn test_get_count_does_not_extend_window() {
        let (c, clock) = manual_counter(Duration::from_secs(3600));
        c.increment("1.2.3.4");
        clock.advance(Duration::from_secs(3000));
        assert_eq!(c.get_count("1.2.3.4"), 1);
        clock.advance(Duration::from_secs(600));
        assert_eq!(c.get_count("1.2.3.4"), 0);
    }

    #[test]
    fn test_key_is_hashed() {
        let key = counter_key("1.2.3.4");
        assert!(key.starts_with(KEY_PREFIX));
        assert!(!key.contains("1.2.3.4"));
        assert_eq!(key.len(), KEY_PREFIX.len() + 64);
        assert_eq!(key, counter_key("1.2.3.4"));
    }
}
