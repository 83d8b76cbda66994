//! OS signal handling.

use crate::lifecycle::Shutdown;

/// Wait for Ctrl+C, then fan the signal out to every subscriber.
pub async fn forward_ctrl_c(shutdown: &Shutdown) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl+C, shutting down"),
    }
    shutdown.trigger();
}
