//! REST endpoint handlers.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/creature` | Current creature snapshot |
//! | `GET` | `/api/health` | Liveness plus connected observer count |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::Uri;
use axum::response::{Html, IntoResponse};
use companion_types::CreatureSnapshot;
use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page with the creature's vitals and API links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.engine.snapshot().await;
    let observers = state.registry.len();
    let status = if snapshot.is_dead() { "DEAD" } else { "ALIVE" };
    let CreatureSnapshot {
        hunger,
        happiness,
        energy,
        age,
        level,
        ..
    } = snapshot;

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Companion</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #58a6ff; margin-bottom: 0.25rem; }}
        .subtitle {{ color: #8b949e; margin-top: 0; }}
        .metric {{
            display: inline-block;
            background: #161b22;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 120px;
        }}
        .metric .label {{ color: #8b949e; font-size: 0.85rem; }}
        .metric .value {{ color: #58a6ff; font-size: 1.5rem; font-weight: bold; }}
        a {{ color: #58a6ff; text-decoration: none; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ padding: 0.3rem 0; }}
        .status {{ color: #3fb950; font-weight: bold; }}
        hr {{ border: none; border-top: 1px solid #30363d; margin: 1.5rem 0; }}
    </style>
</head>
<body>
    <h1>Companion</h1>
    <p class="subtitle">Shared virtual creature</p>

    <p>Status: <span class="status">{status}</span> &middot; {observers} observer(s) connected</p>

    <div>
        <div class="metric"><div class="label">Hunger</div><div class="value">{hunger}</div></div>
        <div class="metric"><div class="label">Happiness</div><div class="value">{happiness}</div></div>
        <div class="metric"><div class="label">Energy</div><div class="value">{energy}</div></div>
        <div class="metric"><div class="label">Age</div><div class="value">{age}</div></div>
        <div class="metric"><div class="label">Level</div><div class="value">{level}</div></div>
    </div>

    <hr>

    <h2>API Endpoints</h2>
    <ul>
        <li>GET <a href="/api/creature">/api/creature</a> -- Current snapshot</li>
        <li>GET <a href="/api/health">/api/health</a> -- Health check</li>
        <li><code>ws://host:port/ws</code> -- Live snapshots; send <code>{{"type":"nourrir"}}</code> to act</li>
    </ul>
</body>
</html>"#
    ))
}

// ---------------------------------------------------------------------------
// GET /api/creature
// ---------------------------------------------------------------------------

/// Return the current creature snapshot, identical to a broadcast frame.
pub async fn get_creature(State(state): State<Arc<AppState>>) -> Json<CreatureSnapshot> {
    Json(state.engine.snapshot().await)
}

// ---------------------------------------------------------------------------
// GET /api/health
// ---------------------------------------------------------------------------

/// Body of `GET /api/health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the server answers.
    pub status: &'static str,
    /// Number of connected observers.
    pub observers: usize,
}

/// Liveness probe.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        observers: state.registry.len(),
    })
}

/// Fallback for unknown routes.
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("no route for {}", uri.path()))
}
