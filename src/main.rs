//! Checkout shield service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Checkout POST            ┌──────────────────────────────────────────────┐
//!     ─────────────────────────┼─▶ http::checkout ─▶ security::CheckoutGuard   │
//!                              │                        │            │         │
//!                              │                        ▼            ▼         │
//!                              │               AttemptCounter    AuditLog      │
//!                              │                        │            │         │
//!                              │                        └─────┬──────┘         │
//!                              │                              ▼                │
//!     Admin API                │                     store::MemoryStore        │
//!     ─────────────────────────┼─▶ admin (auth, tokens) ──▶ AdminControl       │
//!                              │                                               │
//!                              │  lifecycle: janitor, shutdown, snapshot       │
//!                              │  observability: tracing, Prometheus           │
//!                              └──────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use checkout_shield::config::{load_config, ShieldConfig};
use checkout_shield::http::HttpServer;
use checkout_shield::lifecycle::{janitor::StoreJanitor, signals, startup, Shutdown};
use checkout_shield::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "checkout-shield")]
#[command(about = "Per-IP checkout attempt limiting service", long_about = None)]
struct Args {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long, env = "SHIELD_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => ShieldConfig::default(),
    };

    logging::init_tracing(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "checkout-shield starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_attempts = config.rate_limit.max_attempts,
        window_secs = config.rate_limit.window_secs,
        admin_enabled = config.admin.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        // Validation already checked that the address parses.
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    let store = startup::open_store(&config.store)?;
    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Arc::new(Shutdown::new());

    let janitor = StoreJanitor::new(
        store.clone(),
        Duration::from_secs(config.store.purge_interval_secs),
    );
    let janitor_handle = tokio::spawn(janitor.run(shutdown.subscribe()));

    let server = HttpServer::new(config, Arc::new(store.clone()));
    let server_shutdown = shutdown.subscribe();

    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        signals::forward_ctrl_c(&signal_shutdown).await;
    });

    server.run(listener, server_shutdown).await?;

    shutdown.trigger();
    let _ = janitor_handle.await;

    if let Err(e) = store.save_to_file() {
        tracing::error!(error = %e, "Failed to write store snapshot");
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
