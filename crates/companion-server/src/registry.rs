//! Observer registry and snapshot fan-out.
//!
//! The registry maps each connected observer to a bounded queue of
//! serialized frames. It is mutated only on connect and disconnect and
//! read on every broadcast. Broadcasts copy the sender list out of the
//! lock before delivering, so iteration never races with (dis)connection.

use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};

use axum::extract::ws::Utf8Bytes;
use companion_core::SnapshotSink;
use companion_types::CreatureSnapshot;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};
use uuid::Uuid;

/// Identity of one connected observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(Uuid);

impl ObserverId {
    /// Generate a new time-ordered identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ObserverId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// The set of currently connected observers.
#[derive(Debug)]
pub struct ObserverRegistry {
    observers: RwLock<HashMap<ObserverId, mpsc::Sender<Utf8Bytes>>>,
    buffer: usize,
}

impl ObserverRegistry {
    /// Create an empty registry whose observers buffer up to `buffer` frames.
    pub fn new(buffer: usize) -> Self {
        Self {
            observers: RwLock::new(HashMap::new()),
            buffer: buffer.max(1),
        }
    }

    /// Add an observer and queue `initial` as its first frame.
    ///
    /// Returns the observer's id and the receiving end of its queue.
    pub fn register(&self, initial: &CreatureSnapshot) -> (ObserverId, mpsc::Receiver<Utf8Bytes>) {
        let (tx, rx) = mpsc::channel(self.buffer);
        if let Some(frame) = encode(initial) {
            // The queue is fresh and at least one slot deep.
            let _ = tx.try_send(frame);
        }
        let id = ObserverId::new();
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, tx);
        debug!(observer = %id, "observer registered");
        (id, rx)
    }

    /// Remove an observer. Returns `false` if it was already gone.
    pub fn unregister(&self, id: ObserverId) -> bool {
        let removed = self
            .observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some();
        if removed {
            debug!(observer = %id, "observer unregistered");
        }
        removed
    }

    /// Number of connected observers.
    pub fn len(&self) -> usize {
        self.observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no observer is connected.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serialize `snapshot` once and deliver it to every open observer.
    ///
    /// Observers whose queue is closed are dropped from the registry;
    /// observers whose queue is full miss this frame and catch up on the
    /// next one. Returns the number of observers the frame reached.
    pub fn broadcast(&self, snapshot: &CreatureSnapshot) -> usize {
        let Some(frame) = encode(snapshot) else {
            return 0;
        };

        let targets: Vec<(ObserverId, mpsc::Sender<Utf8Bytes>)> = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(id, tx)| (*id, tx.clone()))
            .collect();

        let mut delivered: usize = 0;
        let mut closed = Vec::new();
        for (id, tx) in targets {
            match tx.try_send(frame.clone()) {
                Ok(()) => delivered = delivered.saturating_add(1),
                Err(TrySendError::Full(_)) => {
                    debug!(observer = %id, "observer lagging, frame skipped");
                }
                Err(TrySendError::Closed(_)) => closed.push(id),
            }
        }

        if !closed.is_empty() {
            let mut observers = self
                .observers
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            for id in &closed {
                observers.remove(id);
            }
            debug!(dropped = closed.len(), "closed observers removed");
        }

        delivered
    }
}

impl SnapshotSink for ObserverRegistry {
    fn publish(&self, snapshot: &CreatureSnapshot) -> usize {
        self.broadcast(snapshot)
    }
}

fn encode(snapshot: &CreatureSnapshot) -> Option<Utf8Bytes> {
    match serde_json::to_string(snapshot) {
        Ok(json) => Some(Utf8Bytes::from(json)),
        Err(e) => {
            warn!("Failed to serialize creature snapshot: {e}");
            None
        }
    }
}
