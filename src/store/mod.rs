//! Shared key-value storage.
//!
//! # Data Flow
//! ```text
//! AttemptCounter ─┐
//!                 ├─→ KeyValueStore (get / set with TTL / delete)
//! AuditLog ───────┘        └─→ memory.rs (DashMap + JSON snapshot)
//! ```
//!
//! # Design Decisions
//! - One store per process, passed explicitly as `Arc<dyn KeyValueStore>`
//! - Values are `serde_json::Value`; callers decode and fall back to defaults
//! - Expired entries read as absent

pub mod clock;
pub mod memory;

use std::time::Duration;
use thiserror::Error;

pub use clock::{Clock, ManualClock, SystemClock};
pub use memory::MemoryStore;

/// Errors raised while loading or writing a store snapshot.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("snapshot IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot format error: {0}")]
    Format(#[from] serde_json::Error),
}

/// A key-value store with optional per-entry expiry.
pub trait KeyValueStore: Send + Sync {
    /// Current value for `key`, or `None` when absent or expired.
    fn get(&self, key: &str) -> Option<serde_json::Value>;

    /// Store `value` under `key`. `None` keeps it until deleted.
    fn set(&self, key: &str, value: serde_json::Value, ttl: Option<Duration>);

    /// Remove `key`. Returns whether a live entry was removed.
    fn delete(&self, key: &str) -> bool;

    /// Add one to the integer stored at `key` and refresh its expiry.
    ///
    /// Anything that is not an unsigned integer counts as zero. The default
    /// is a plain read-then-write and can lose updates under concurrent
    /// callers; stores with a native increment should override it.
    fn increment(&self, key: &str, ttl: Duration) -> u64 {
        let next = self.get(key).as_ref().map(read_count).unwrap_or(0) + 1;
        self.set(key, serde_json::Value::from(next), Some(ttl));
        next
    }
}

/// Lenient integer decoding for counter values.
pub fn read_count(value: &serde_json::Value) -> u64 {
    match value {
        serde_json::Value::Number(n) => n.as_u64().unwrap_or(0),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}
