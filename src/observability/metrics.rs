//! Metrics collection and exposition.
//!
//! # Metrics
//! - `checkout_decisions_total` (counter): decisions by outcome
//! - `checkout_blocked_logged_total` (counter): submissions written to the audit log
//! - `admin_actions_total` (counter): admin actions by name and whether applied
//! - `audit_log_entries` (gauge): entries currently in the audit log
//! - `store_keys` (gauge): entries held by the store after a sweep

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_decision(decision: &'static str) {
    counter!("checkout_decisions_total", "decision" => decision).increment(1);
}

pub fn record_blocked_logged() {
    counter!("checkout_blocked_logged_total").increment(1);
}

pub fn record_admin_action(action: &'static str, applied: bool) {
    counter!(
        "admin_actions_total",
        "action" => action,
        "applied" => if applied { "true" } else { "false" }
    )
    .increment(1);
}

pub fn record_audit_log_size(entries: usize) {
    gauge!("audit_log_entries").set(entries as f64);
}

pub fn record_store_keys(keys: usize) {
    gauge!("store_keys").set(keys as f64);
}
