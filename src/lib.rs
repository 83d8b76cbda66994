//! Checkout shield: per-IP checkout attempt limiting with an audit log.

pub mod admin;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;
pub mod store;

pub use config::ShieldConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
