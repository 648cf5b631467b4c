//! Server binary for the Companion simulation.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `companion-config.yaml` (or `COMPANION_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Build the engine and observer registry
//! 4. Start the decay and heartbeat schedulers
//! 5. Start the HTTP + `WebSocket` server
//! 6. Run until `Ctrl-C`, then stop the server and schedulers

mod error;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use companion_core::config::LoggingConfig;
use companion_core::{CompanionConfig, spawn_schedulers};
use companion_server::{AppState, spawn_server};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "companion-config.yaml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = config_path();
    let config = load_config_from(&path).context("loading configuration")?;
    init_tracing(&config.logging)?;
    if !path.exists() {
        info!(path = %path.display(), "config file not found, using defaults");
    }

    info!(
        host = config.server.host,
        port = config.server.port,
        decay_interval_ms = config.decay.interval_ms,
        cooldown_ms = config.actions.cooldown_ms,
        probation_ms = config.level.probation_ms,
        seeded = config.seed.is_some(),
        "companion-engine starting"
    );

    let server_config = config.server.clone();
    let state = Arc::new(AppState::new(config).map_err(EngineError::from)?);

    let schedulers = spawn_schedulers(&state.engine);

    let server = spawn_server(&server_config, Arc::clone(&state))
        .await
        .map_err(EngineError::from)
        .context("starting HTTP server")?;
    info!(addr = %server.local_addr, "Companion server started");

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    info!("shutdown signal received");

    server.shutdown().await;
    schedulers.shutdown();
    info!("companion-engine stopped");

    Ok(())
}

/// Resolve the configuration path from `COMPANION_CONFIG`, falling back
/// to [`DEFAULT_CONFIG_PATH`].
fn config_path() -> PathBuf {
    std::env::var_os("COMPANION_CONFIG")
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

/// Load configuration, using defaults when the file does not exist.
fn load_config_from(path: &Path) -> Result<CompanionConfig, EngineError> {
    if path.exists() {
        Ok(CompanionConfig::from_file(path)?)
    } else {
        let mut config = CompanionConfig::default();
        config.server.apply_env_overrides();
        Ok(config)
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(logging: &LoggingConfig) -> Result<(), EngineError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = if logging.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|e| EngineError::Logging {
        message: e.to_string(),
    })
}
