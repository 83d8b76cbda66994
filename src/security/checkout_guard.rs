//! Allow/block decision for checkout submissions.
//!
//! ```text
//! submission
//!     → read count for the client address
//!     → count >= max ─────────────→ log entry, Blocked (count untouched)
//!     → increment
//!         → new == max ───────────→ log entry, Allowed
//!         → otherwise ────────────→ Allowed
//! ```
//!
//! The submission that reaches the limit goes through but is logged as if
//! blocked; only the one after it is refused.

use std::sync::Arc;
use std::time::Duration;

use crate::config::RateLimitConfig;
use crate::observability::metrics;
use crate::security::attempts::AttemptCounter;
use crate::security::audit_log::{AuditLog, LogEntry};
use crate::security::client_ip::ClientContext;
use crate::security::sanitize::escape_html;
use crate::store::KeyValueStore;

/// A checkout form submission as seen by the guard.
#[derive(Debug, Clone, Default)]
pub struct CheckoutSubmission {
    pub client: ClientContext,
    pub billing_email: Option<String>,
}

/// Outcome of evaluating a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allowed {
        attempts: u64,
        /// This submission reached the limit and was logged.
        threshold_reached: bool,
    },
    Blocked {
        attempts: u64,
        /// User-facing explanation, HTML-safe.
        notice: String,
    },
}

impl Decision {
    pub fn is_blocked(&self) -> bool {
        matches!(self, Decision::Blocked { .. })
    }

    pub fn attempts(&self) -> u64 {
        match self {
            Decision::Allowed { attempts, .. } | Decision::Blocked { attempts, .. } => *attempts,
        }
    }
}

#[derive(Clone)]
pub struct CheckoutGuard {
    counter: AttemptCounter,
    log: AuditLog,
    max_attempts: u64,
}

impl CheckoutGuard {
    pub fn new(counter: AttemptCounter, log: AuditLog, max_attempts: u64) -> Self {
        Self {
            counter,
            log,
            max_attempts,
        }
    }

    /// Wire a counter and a log over one shared store.
    pub fn from_config(store: Arc<dyn KeyValueStore>, config: &RateLimitConfig) -> Self {
        let counter = AttemptCounter::new(store.clone(), Duration::from_secs(config.window_secs));
        let log = AuditLog::new(store, config.log_key.clone(), config.log_capacity);
        Self::new(counter, log, config.max_attempts)
    }

    pub fn counter(&self) -> &AttemptCounter {
        &self.counter
    }

    pub fn log(&self) -> &AuditLog {
        &self.log
    }

    pub fn max_attempts(&self) -> u64 {
        self.max_attempts
    }

    /// Whether the next submission from `address` would be refused.
    pub fn is_blocked(&self, address: &str) -> bool {
        self.counter.get_count(address) >= self.max_attempts
    }

    pub fn evaluate(&self, submission: &CheckoutSubmission) -> Decision {
        let client = &submission.client;
        let email = submission.billing_email.as_deref();
        let current = self.counter.get_count(&client.address);

        if current >= self.max_attempts {
            self.log.record(LogEntry::capture(client, current, email));
            metrics::record_blocked_logged();
            metrics::record_decision("blocked");
            tracing::warn!(
                client = %client.address,
                attempts = current,
                "Checkout blocked"
            );
            return Decision::Blocked {
                attempts: current,
                notice: self.block_notice(&client.address),
            };
        }

        let attempts = self.counter.increment(&client.address);
        let threshold_reached = attempts == self.max_attempts;
        if threshold_reached {
            self.log.record(LogEntry::capture(client, attempts, email));
            metrics::record_blocked_logged();
            tracing::info!(
                client = %client.address,
                attempts,
                "Checkout attempt limit reached, further attempts will be blocked"
            );
        } else {
            tracing::debug!(client = %client.address, attempts, "Checkout allowed");
        }
        metrics::record_decision("allowed");

        Decision::Allowed {
            attempts,
            threshold_reached,
        }
    }

    fn block_notice(&self, address: &str) -> String {
        format!(
            "We detected several payment attempts from your IP ({}). \
             For security, new attempts are blocked for {} minutes.",
            escape_html(address),
            self.counter.window().as_secs() / 60
        )
    }
}
