//! Startup orchestration.
//!
//! # Responsibilities
//! - Open the shared store (from snapshot when configured)
//! - Fail fast on unreadable snapshots rather than starting empty

use crate::config::StoreConfig;
use crate::store::{MemoryStore, StoreError};

pub fn open_store(config: &StoreConfig) -> Result<MemoryStore, StoreError> {
    match &config.persistence_path {
        Some(path) => MemoryStore::load_from_file(path),
        None => {
            tracing::info!("No persistence path configured, store is memory-only");
            Ok(MemoryStore::new(None))
        }
    }
}
