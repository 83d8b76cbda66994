//! Manual unblocking and audit log pruning.
//!
//! Every operation is gated on the caller's manage capability; without it
//! the call does nothing and reports that nothing was applied.

use crate::admin::auth::Authorize;
use crate::security::{AttemptCounter, AuditLog};

/// Result of an applied unblock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unblocked {
    pub removed_logs: usize,
}

#[derive(Clone)]
pub struct AdminControl {
    counter: AttemptCounter,
    log: AuditLog,
}

impl AdminControl {
    pub fn new(counter: AttemptCounter, log: AuditLog) -> Self {
        Self { counter, log }
    }

    /// Reset the counter for `address` and optionally drop its log entries.
    ///
    /// `None` when the caller may not manage.
    pub fn unblock(
        &self,
        caller: &impl Authorize,
        address: &str,
        also_remove_logs: bool,
    ) -> Option<Unblocked> {
        if !caller.can_manage() {
            return None;
        }

        self.counter.reset(address);
        let removed_logs = if also_remove_logs {
            self.log.remove_by_address(address)
        } else {
            0
        };
        tracing::info!(client = %address, removed_logs, "Client unblocked");
        Some(Unblocked { removed_logs })
    }

    /// Remove one log entry by its position in the current listing.
    ///
    /// `None` when the caller may not manage, otherwise whether an entry existed.
    pub fn remove_log_entry(&self, caller: &impl Authorize, index: usize) -> Option<bool> {
        if !caller.can_manage() {
            return None;
        }

        let removed = self.log.remove_by_index(index);
        tracing::info!(index, removed, "Audit log entry removal");
        Some(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::auth::AdminSession;
    use crate::security::{ClientContext, LogEntry};
    use crate::store::MemoryStore;
    use std::sync::Arc;
    use std::time::Duration;

    const MANAGER: AdminSession = AdminSession { can_manage: true };
    const VIEWER: AdminSession = AdminSession { can_manage: false };

    fn setup() -> (AdminControl, AttemptCounter, AuditLog) {
        let store = Arc::new(MemoryStore::new(None));
        let counter = AttemptCounter::new(store.clone(), Duration::from_secs(3600));
        let log = AuditLog::new(store, "ip_block_logs", 500);
        (AdminControl::new(counter.clone(), log.clone()), counter, log)
    }

    fn record(log: &AuditLog, ip: &str) {
        log.record(LogEntry::capture(&ClientContext::from_address(ip), 5, None));
    }

    #[test]
    fn test_unblock_keeps_logs_by_default() {
        let (control, counter, log) = setup();
        for _ in 0..5 {
            counter.increment("1.2.3.4");
        }
        record(&log, "1.2.3.4");

        assert_eq!(
            control.unblock(&MANAGER, "1.2.3.4", false),
            Some(Unblocked { removed_logs: 0 })
        );
        assert_eq!(counter.get_count("1.2.3.4"), 0);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_unblock_with_log_removal() {
        let (control, counter, log) = setup();
        counter.increment("1.2.3.4");
        record(&log, "1.2.3.4");
        record(&log, "5.6.7.8");
        record(&log, "1.2.3.4");

        assert_eq!(
            control.unblock(&MANAGER, "1.2.3.4", true),
            Some(Unblocked { removed_logs: 2 })
        );
        let ips: Vec<_> = log.list().into_iter().map(|e| e.ip).collect();
        assert_eq!(ips, vec!["5.6.7.8"]);
    }

    #[test]
    fn test_without_capability_is_noop() {
        let (control, counter, log) = setup();
        counter.increment("1.2.3.4");
        record(&log, "1.2.3.4");

        assert_eq!(control.unblock(&VIEWER, "1.2.3.4", true), None);
        assert_eq!(control.remove_log_entry(&VIEWER, 0), None);
        assert_eq!(counter.get_count("1.2.3.4"), 1);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_remove_log_entry() {
        let (control, _, log) = setup();
        record(&log, "1.1.1.1");
        record(&log, "2.2.2.2");

        assert_eq!(control.remove_log_entry(&MANAGER, 0), Some(true));
        assert_eq!(control.remove_log_entry(&MANAGER, 5), Some(false));
        assert_eq!(log.list()[0].ip, "1.1.1.1");
    }
}
