//! Shared application state for the Axum server.

use std::sync::Arc;

use companion_core::{Companion, CompanionConfig, ConfigError, SnapshotSink};

use crate::registry::ObserverRegistry;

/// Shared state injected into every handler via Axum's `State` extractor.
///
/// The engine publishes into the registry; socket handlers register with
/// the registry and forward requests to the engine.
#[derive(Clone)]
pub struct AppState {
    /// The creature engine.
    pub engine: Arc<Companion>,
    /// Connected observers.
    pub registry: Arc<ObserverRegistry>,
}

impl AppState {
    /// Build a registry and an engine that publishes into it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `config` fails validation.
    pub fn new(config: CompanionConfig) -> Result<Self, ConfigError> {
        let registry = Arc::new(ObserverRegistry::new(config.broadcast.observer_buffer));
        let engine = Companion::new(config, Arc::clone(&registry) as Arc<dyn SnapshotSink>)?;
        Ok(Self { engine, registry })
    }
}
