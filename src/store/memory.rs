//! In-process key-value store with expiry and snapshot persistence.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::store::clock::{deadline, Clock, SystemClock};
use crate::store::{read_count, KeyValueStore, StoreError};

/// A stored value and its expiry (milliseconds since epoch).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredValue {
    value: serde_json::Value,
    #[serde(default)]
    expires_at: Option<u64>,
}

impl StoredValue {
    fn is_expired(&self, now: u64) -> bool {
        matches!(self.expires_at, Some(deadline) if deadline <= now)
    }
}

/// Sibling file the snapshot is written to before being renamed into place.
fn temp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

/// A thread-safe store shared by every component in the process.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<DashMap<String, StoredValue>>,
    persistence_path: Option<PathBuf>,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(None)
    }
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new(persistence_path: Option<PathBuf>) -> Self {
        Self::with_clock(persistence_path, Arc::new(SystemClock))
    }

    /// Create a new empty store reading time from `clock`.
    pub fn with_clock(persistence_path: Option<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            persistence_path,
            clock,
        }
    }

    /// Load from a snapshot file if it exists. Expired entries are skipped.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let store = Self::new(Some(path.to_path_buf()));
        if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            let map: HashMap<String, StoredValue> = serde_json::from_reader(reader)?;

            let now = store.clock.now_millis();
            for (key, value) in map.into_iter().filter(|(_, v)| !v.is_expired(now)) {
                store.inner.insert(key, value);
            }
            tracing::info!(path = %path.display(), keys = store.inner.len(), "Loaded store snapshot");
        }
        Ok(store)
    }

    /// Write every live entry to the snapshot file, if one is configured.
    ///
    /// The snapshot is written to a temporary sibling and renamed over the
    /// old one, so an interrupted write never leaves a truncated file behind.
    pub fn save_to_file(&self) -> Result<(), StoreError> {
        let Some(path) = &self.persistence_path else {
            return Ok(());
        };

        let now = self.clock.now_millis();
        let map: HashMap<_, _> = self
            .inner
            .iter()
            .filter(|r| !r.value().is_expired(now))
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect();

        let tmp = temp_path(path);
        let mut writer = BufWriter::new(File::create(&tmp)?);
        serde_json::to_writer(&mut writer, &map)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        drop(writer);
        fs::rename(&tmp, path)?;

        tracing::info!(path = %path.display(), keys = map.len(), "Saved store snapshot");
        Ok(())
    }

    /// Drop expired entries. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now_millis();
        let before = self.inner.len();
        self.inner.retain(|_, v| !v.is_expired(now));
        before.saturating_sub(self.inner.len())
    }

    /// Number of entries held, including any not yet purged.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<serde_json::Value> {
        let now = self.clock.now_millis();
        let expired = match self.inner.get(key) {
            Some(entry) if !entry.is_expired(now) => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.inner.remove_if(key, |_, v| v.is_expired(now));
        }
        None
    }

    fn set(&self, key: &str, value: serde_json::Value, ttl: Option<Duration>) {
        let expires_at = ttl.map(|ttl| deadline(self.clock.now_millis(), ttl));
        self.inner
            .insert(key.to_string(), StoredValue { value, expires_at });
    }

    fn delete(&self, key: &str) -> bool {
        let now = self.clock.now_millis();
        self.inner
            .remove(key)
            .map(|(_, v)| !v.is_expired(now))
            .unwrap_or(false)
    }

    // Holds the shard lock for the whole update, so concurrent increments
    // of the same key are never lost.
    fn increment(&self, key: &str, ttl: Duration) -> u64 {
        let now = self.clock.now_millis();
        let mut entry = self
            .inner
            .entry(key.to_string())
            .or_insert_with(|| StoredValue {
                value: serde_json::Value::from(0u64),
                expires_at: None,
            });

        let current = if entry.is_expired(now) {
            0
        } else {
            read_count(&entry.value)
        };
        let next = current + 1;
        *entry = StoredValue {
            value: serde_json::Value::from(next),
            expires_at: Some(deadline(now, ttl)),
        };
        next
    }
}
