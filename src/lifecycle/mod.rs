//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load snapshot → Build store, guard, admin control → Start listener
//!
//! Background (janitor.rs):
//!     Every purge interval → drop expired counters
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     Ctrl+C → Stop accepting → Stop janitor → Write snapshot → Exit
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Snapshot is written after the server has drained

pub mod janitor;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
