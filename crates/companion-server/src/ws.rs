//! `WebSocket` handler: live snapshots out, action requests in.
//!
//! Clients connect to `GET /ws`. On connect the observer is registered and
//! immediately receives the current snapshot, then one frame per change
//! and per heartbeat. Text frames from the client are action requests of
//! the form `{ "type": "nourrir" }`. A request that cannot be parsed or
//! processed gets an error payload on this socket only.

use std::sync::Arc;

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::{IntoResponse, Response};
use companion_types::{ActionRequest, ErrorPayload};
use tracing::{debug, warn};

use crate::handlers;
use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` observer connection.
///
/// # Route
///
/// `GET /ws`
pub async fn ws_creature(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

/// Serve the root path: upgrade `WebSocket` handshakes, answer plain
/// requests with the HTML status page.
///
/// Existing clients connect to `ws://host:port` with no path.
///
/// # Route
///
/// `GET /`
pub async fn ws_or_index(
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    state: State<Arc<AppState>>,
) -> Response {
    match upgrade {
        Ok(ws) => ws_creature(ws, state).await.into_response(),
        Err(_) => handlers::index(state).await.into_response(),
    }
}

/// Handle the socket lifecycle: register, pump frames both ways, and
/// unregister on any exit path.
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    let registry = Arc::clone(&state.registry);
    let (id, mut rx) = state
        .engine
        .observe(|snapshot| registry.register(snapshot))
        .await;
    debug!(observer = %id, "WebSocket observer connected");

    loop {
        tokio::select! {
            frame = rx.recv() => {
                let Some(frame) = frame else {
                    debug!(observer = %id, "observer queue closed");
                    break;
                };
                if socket.send(Message::Text(frame)).await.is_err() {
                    debug!(observer = %id, "WebSocket client disconnected (send failed)");
                    break;
                }
            }
            msg = socket.recv() => {
                let reply = match msg {
                    Some(Ok(Message::Text(text))) => handle_request(&state, text.as_str()).await,
                    Some(Ok(Message::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                        Ok(text) => handle_request(&state, text).await,
                        Err(_) => Some(ErrorPayload::invalid_request("binary frame is not UTF-8")),
                    },
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!(observer = %id, "WebSocket client disconnected (pong failed)");
                            break;
                        }
                        None
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(observer = %id, "WebSocket client disconnected");
                        break;
                    }
                    Some(Err(e)) => {
                        debug!(observer = %id, "WebSocket error: {e}");
                        break;
                    }
                    Some(Ok(Message::Pong(_))) => None,
                };

                if let Some(payload) = reply
                    && send_error(&mut socket, &payload).await.is_err()
                {
                    break;
                }
            }
        }
    }

    state.registry.unregister(id);
}

/// Parse and apply one action request.
///
/// Returns the error payload to send back to the requester, or `None` if
/// the request was processed (applied or ignored on cooldown). The state
/// broadcast that follows a processed request reaches the requester
/// through its observer queue like everyone else.
pub async fn handle_request(state: &AppState, raw: &str) -> Option<ErrorPayload> {
    let request: ActionRequest = match serde_json::from_str(raw) {
        Ok(request) => request,
        Err(e) => {
            debug!(error = %e, "rejecting malformed action request");
            return Some(ErrorPayload::invalid_request(format!(
                "invalid action request: {e}"
            )));
        }
    };

    match state.engine.perform(request.kind).await {
        Ok(outcome) => {
            debug!(action = %request.kind, ?outcome, "action processed");
            None
        }
        Err(e) => {
            warn!(action = %request.kind, error = %e, "action processing failed");
            Some(ErrorPayload::internal(
                "an error occurred while processing your request",
            ))
        }
    }
}

async fn send_error(socket: &mut WebSocket, payload: &ErrorPayload) -> Result<(), axum::Error> {
    let json = serde_json::to_string(payload).map_err(axum::Error::new)?;
    socket.send(Message::Text(json.into())).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use companion_core::CompanionConfig;
    use companion_types::ErrorCode;

    use super::*;

    fn state() -> AppState {
        AppState::new(CompanionConfig {
            seed: Some(11),
            ..CompanionConfig::default()
        })
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn valid_request_mutates_and_broadcasts() {
        let state = state();
        let initial = state.engine.snapshot().await;
        let (_id, mut rx) = state.registry.register(&initial);
        rx.recv().await.unwrap();

        assert!(handle_request(&state, r#"{"type":"nourrir"}"#).await.is_none());

        let frame = rx.recv().await.unwrap();
        let pushed: companion_types::CreatureSnapshot =
            serde_json::from_str(frame.as_str()).unwrap();
        assert!(!pushed.can_feed);
        assert!(pushed.hunger > 50);
        assert_eq!(pushed, state.engine.snapshot().await);
    }

    #[tokio::test(start_paused = true)]
    async fn english_alias_is_accepted() {
        let state = state();
        assert!(handle_request(&state, r#"{"type":"rest"}"#).await.is_none());
        assert!(!state.engine.snapshot().await.can_rest);
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_json_is_reported_without_mutation() {
        let state = state();
        let before = state.engine.snapshot().await;
        let reply = handle_request(&state, "{not json").await.unwrap();
        assert_eq!(reply.code, ErrorCode::InvalidRequest);
        assert_eq!(state.engine.snapshot().await, before);
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_action_is_reported_without_mutation() {
        let state = state();
        let before = state.engine.snapshot().await;
        let reply = handle_request(&state, r#"{"type":"danser"}"#).await.unwrap();
        assert_eq!(reply.code, ErrorCode::InvalidRequest);
        assert!(reply.error.contains("invalid action request"));
        assert_eq!(state.engine.snapshot().await, before);
    }

    #[tokio::test(start_paused = true)]
    async fn cooldown_request_is_not_an_error() {
        let state = state();
        assert!(handle_request(&state, r#"{"type":"jouer"}"#).await.is_none());
        let after_first = state.engine.snapshot().await;
        assert!(handle_request(&state, r#"{"type":"jouer"}"#).await.is_none());
        assert_eq!(state.engine.snapshot().await, after_first);
    }
}
