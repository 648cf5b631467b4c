//! Server startup helper for embedding in the engine binary.
//!
//! [`spawn_server`] binds eagerly so a busy port fails startup instead of
//! surfacing later from a background task.

use std::sync::Arc;

use companion_core::config::ServerConfig;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::server::{self, ServerError};
use crate::state::AppState;

/// Errors that can occur when spawning the server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind or start.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// A server running on a background task.
#[derive(Debug)]
pub struct ServerHandle {
    /// Address actually bound (resolves port `0`).
    pub local_addr: std::net::SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl ServerHandle {
    /// Stop accepting connections and wait for in-flight requests.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "server task ended abnormally");
        }
    }
}

/// Bind the configured address and serve on a background Tokio task.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if the address cannot be bound.
pub async fn spawn_server(
    config: &ServerConfig,
    state: Arc<AppState>,
) -> Result<ServerHandle, StartupError> {
    let listener = server::bind(config).await?;
    let local_addr = listener
        .local_addr()
        .map_err(|e| ServerError::Bind(format!("no local address: {e}")))?;
    let (shutdown, signal) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let shutdown = async {
            let _ = signal.await;
        };
        if let Err(e) = server::serve(listener, state, shutdown).await {
            tracing::error!(error = %e, "Companion server exited with error");
        }
    });

    tracing::info!(%local_addr, "Companion server spawned on background task");

    Ok(ServerHandle {
        local_addr,
        shutdown,
        task,
    })
}
