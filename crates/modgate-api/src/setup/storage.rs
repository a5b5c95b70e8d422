//! Storage setup and initialization

use anyhow::{Context, Result};
use modgate_core::Config;
use modgate_storage::{create_storage, Storage};
use std::sync::Arc;

pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    tracing::info!("Initializing storage abstraction...");
    let storage = create_storage(&config.storage)
        .await
        .context("Failed to initialize storage")?;
    tracing::info!(
        backend = %storage.backend_type(),
        bucket = ?config.storage.bucket,
        "Storage abstraction initialized successfully"
    );
    Ok(storage)
}
