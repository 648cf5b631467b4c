//! Test doubles shared by the unit tests of this crate.

use std::sync::Mutex;

use companion_types::CreatureSnapshot;

use crate::engine::SnapshotSink;

/// Sink that keeps every published snapshot.
#[derive(Default)]
pub struct RecordingSink {
    frames: Mutex<Vec<CreatureSnapshot>>,
}

impl RecordingSink {
    pub fn frames(&self) -> Vec<CreatureSnapshot> {
        self.frames
            .lock()
            .map(|frames| frames.clone())
            .unwrap_or_default()
    }

    pub fn last(&self) -> Option<CreatureSnapshot> {
        self.frames().pop()
    }
}

impl SnapshotSink for RecordingSink {
    fn publish(&self, snapshot: &CreatureSnapshot) -> usize {
        if let Ok(mut frames) = self.frames.lock() {
            frames.push(snapshot.clone());
        }
        1
    }
}
