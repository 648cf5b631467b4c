//! Observer transport for the Companion simulation.
//!
//! This crate puts the engine from `companion-core` on the network:
//!
//! - **`WebSocket` endpoint** (`/ws`) that pushes a full creature snapshot
//!   on every change and on a fixed heartbeat, and accepts action requests
//! - **REST endpoints** for polling the snapshot and checking health
//! - **Minimal HTML page** (`GET /`) showing the creature's vitals
//!
//! # Architecture
//!
//! [`ObserverRegistry`] is the engine's [`SnapshotSink`]: each connected
//! socket owns a bounded queue in the registry, and a broadcast serializes
//! the snapshot once and hands the same frame to every queue. Socket tasks
//! drain their own queue, so a slow client never blocks the engine.
//!
//! [`SnapshotSink`]: companion_core::SnapshotSink

pub mod error;
pub mod handlers;
pub mod registry;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use registry::{ObserverId, ObserverRegistry};
pub use router::build_router;
pub use server::{ServerError, start_server};
pub use startup::{ServerHandle, StartupError, spawn_server};
pub use state::AppState;
