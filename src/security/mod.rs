//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Checkout submission:
//!     → client_ip.rs (resolve client address from headers / peer)
//!     → checkout_guard.rs (allow / block decision)
//!         → attempts.rs (per-address counter, sliding expiry)
//!         → audit_log.rs (bounded newest-first log of blocks)
//!     → Pass decision to the checkout handler
//! ```
//!
//! # Design Decisions
//! - Fail open: missing headers and corrupt storage degrade to defaults
//! - Counter and log live in the shared store, never in component state
//! - No trust in client input: everything logged is sanitized first

pub mod attempts;
pub mod audit_log;
pub mod checkout_guard;
pub mod client_ip;
pub mod sanitize;

pub use attempts::AttemptCounter;
pub use audit_log::{AuditLog, LogEntry};
pub use checkout_guard::{CheckoutGuard, CheckoutSubmission, Decision};
pub use client_ip::{resolve_client_address, ClientContext};
