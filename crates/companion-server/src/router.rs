//! Axum router construction.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /` -- `WebSocket` observer channel on upgrade, HTML status page otherwise
/// - `GET /ws` -- `WebSocket` observer channel
/// - `GET /api/creature` -- current creature snapshot
/// - `GET /tamagotchi` -- same snapshot, the path existing clients poll
/// - `GET /api/health` -- health check
///
/// Any origin is allowed; the creature is a shared public toy.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(ws::ws_or_index))
        .route("/ws", get(ws::ws_creature))
        .route("/api/creature", get(handlers::get_creature))
        .route("/tamagotchi", get(handlers::get_creature))
        .route("/api/health", get(handlers::health))
        .fallback(handlers::not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
