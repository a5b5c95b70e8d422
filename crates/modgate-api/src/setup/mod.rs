//! Application setup and initialization

pub mod routes;
pub mod server;
pub mod services;
pub mod storage;

use anyhow::{Context, Result};
use modgate_core::Config;
use modgate_infra::LogFormat;
use std::sync::Arc;

use crate::state::AppState;
use services::ModerationRuntime;

/// Everything `main` needs to serve and later shut down.
pub struct App {
    pub state: Arc<AppState>,
    pub router: axum::Router,
    pub runtime: ModerationRuntime,
}

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<App> {
    // Validate configuration first - fail fast on misconfiguration
    config
        .validate()
        .context("Configuration validation failed")?;

    let log_format = config
        .base
        .log_format
        .parse::<LogFormat>()
        .unwrap_or(LogFormat::Pretty);
    modgate_infra::init_telemetry(log_format)
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.base.environment,
        "Configuration loaded and validated successfully"
    );

    let storage = storage::setup_storage(&config).await?;

    let (state, runtime) = services::initialize_services(&config, storage).await?;

    let router = routes::setup_routes(&config, state.clone())?;

    Ok(App {
        state,
        router,
        runtime,
    })
}
