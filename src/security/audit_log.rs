//! Bounded log of blocked checkout attempts, newest first.
//!
//! The whole list lives under one store key and every operation is a full
//! read-modify-write. Positions are not identities: removing by index acts
//! on the listing as it is at the time of the call.

use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::observability::metrics;
use crate::security::client_ip::ClientContext;
use crate::security::sanitize::sanitize_email;
use crate::store::KeyValueStore;

/// One recorded block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Local time of capture, `YYYY-MM-DD HH:MM:SS`.
    #[serde(default)]
    pub time: String,
    /// Seconds since epoch.
    #[serde(default)]
    pub timestamp: i64,
    pub ip: String,
    #[serde(default)]
    pub attempts: u64,
    #[serde(default)]
    pub user_agent: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub url: String,
}

impl LogEntry {
    /// Capture an entry for `client` at the current time.
    pub fn capture(client: &ClientContext, attempts: u64, email: Option<&str>) -> Self {
        Self {
            time: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            timestamp: Utc::now().timestamp(),
            ip: client.address.clone(),
            attempts,
            user_agent: client.user_agent.clone().unwrap_or_default(),
            email: email.map(sanitize_email).unwrap_or_default(),
            url: client.request_uri.clone().unwrap_or_default(),
        }
    }
}

#[derive(Clone)]
pub struct AuditLog {
    store: Arc<dyn KeyValueStore>,
    key: String,
    capacity: usize,
}

impl AuditLog {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>, capacity: usize) -> Self {
        Self {
            store,
            key: key.into(),
            capacity,
        }
    }

    /// Decode the stored list. Anything that is not a list reads as empty,
    /// and list items that do not decode are skipped.
    fn load(&self) -> Vec<LogEntry> {
        match self.store.get(&self.key) {
            Some(serde_json::Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
            Some(_) => {
                tracing::warn!(key = %self.key, "Audit log storage is not a list, treating as empty");
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    fn save(&self, entries: &[LogEntry]) {
        match serde_json::to_value(entries) {
            Ok(value) => {
                self.store.set(&self.key, value, None);
                metrics::record_audit_log_size(entries.len());
            }
            Err(e) => tracing::error!(error = %e, "Failed to encode audit log"),
        }
    }

    /// Prepend `entry` and drop whatever falls past the capacity.
    pub fn record(&self, entry: LogEntry) {
        let mut entries = self.load();
        entries.insert(0, entry);
        entries.truncate(self.capacity);
        self.save(&entries);
    }

    /// Remove every entry for `address`. Returns how many were removed.
    pub fn remove_by_address(&self, address: &str) -> usize {
        let mut entries = self.load();
        let before = entries.len();
        entries.retain(|e| e.ip != address);
        let removed = before - entries.len();
        if removed > 0 {
            self.save(&entries);
        }
        removed
    }

    /// Remove the entry at `index` in the current listing, if there is one.
    pub fn remove_by_index(&self, index: usize) -> bool {
        let mut entries = self.load();
        if index >= entries.len() {
            return false;
        }
        entries.remove(index);
        self.save(&entries);
        true
    }

    /// Current entries, newest first.
    pub fn list(&self) -> Vec<LogEntry> {
        self.load()
    }

    pub fn len(&self) -> usize {
        self.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn entry(ip: &str, attempts: u64) -> LogEntry {
        LogEntry::capture(&ClientContext::from_address(ip), attempts, None)
    }

    fn log_with_store(capacity: usize) -> (AuditLog, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new(None));
        (AuditLog::new(store.clone(), "ip_block_logs", capacity), store)
    }

    #[test]
    fn test_record_is_newest_first() {
        let (log, _) = log_with_store(500);
        log.record(entry("1.1.1.1", 1));
        log.record(entry("2.2.2.2", 2));

        let ips: Vec<_> = log.list().into_iter().map(|e| e.ip).collect();
        assert_eq!(ips, vec!["2.2.2.2", "1.1.1.1"]);
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let (log, _) = log_with_store(500);
        for i in 0..501u64 {
            log.record(entry("1.1.1.1", i));
        }

        let entries = log.list();
        assert_eq!(entries.len(), 500);
        assert_eq!(entries[0].attempts, 500);
        assert_eq!(entries[499].attempts, 1);
    }

    #[test]
    fn test_remove_by_address() {
        let (log, _) = log_with_store(500);
        log.record(entry("1.1.1.1", 1));
        log.record(entry("2.2.2.2", 2));
        log.record(entry("1.1.1.1", 3));
        log.record(entry("3.3.3.3", 4));

        assert_eq!(log.remove_by_address("1.1.1.1"), 2);

        let remaining: Vec<_> = log.list().into_iter().map(|e| (e.ip, e.attempts)).collect();
        assert_eq!(
            remaining,
            vec![("3.3.3.3".to_string(), 4), ("2.2.2.2".to_string(), 2)]
        );
        assert_eq!(log.remove_by_address("9.9.9.9"), 0);
    }

    #[test]
    fn test_remove_by_index_compacts() {
        let (log, _) = log_with_store(500);
        for i in 1..=3 {
            log.record(entry("1.1.1.1", i));
        }

        assert!(log.remove_by_index(1));
        let attempts: Vec<_> = log.list().into_iter().map(|e| e.attempts).collect();
        assert_eq!(attempts, vec![3, 1]);

        assert!(log.remove_by_index(1));
        assert!(!log.remove_by_index(1));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_corrupt_storage_reads_empty_and_resets() {
        let (log, store) = log_with_store(500);
        store.set("ip_block_logs", json!("garbage"), None);
        assert!(log.is_empty());

        log.record(entry("1.1.1.1", 5));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_malformed_items_are_skipped() {
        let (log, store) = log_with_store(500);
        store.set(
            "ip_block_logs",
            json!([{"ip": "1.1.1.1", "attempts": 5}, 42, {"attempts": 1}]),
            None,
        );

        let entries = log.list();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].ip, "1.1.1.1");
        assert_eq!(entries[0].email, "");
    }

    #[test]
    fn test_capture_sanitizes_email() {
        let client = ClientContext {
            address: "1.1.1.1".into(),
            user_agent: Some("curl/8.0".into()),
            request_uri: Some("/checkout".into()),
        };
        let e = LogEntry::capture(&client, 5, Some(" buyer@example.com"));
        assert_eq!(e.email, "buyer@example.com");
        assert_eq!(e.user_agent, "curl/8.0");
        assert_eq!(e.url, "/checkout");
        assert_eq!(e.time.len(), 19);
        assert!(e.timestamp > 0);
    }
}
