//! The public projection of the creature.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Complete public state of the creature as pushed to every observer.
///
/// This is a full snapshot, never a diff. Internal scheduling handles
/// (cooldown tasks, the pending level promotion) are deliberately absent.
/// Timestamps are serialized as Unix epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct CreatureSnapshot {
    /// Satiety in `[0, 100]`.
    pub hunger: u32,
    /// Mood in `[0, 100]`.
    pub happiness: u32,
    /// Stamina in `[0, 100]`.
    pub energy: u32,
    /// Whether `feed` is currently accepted.
    pub can_feed: bool,
    /// Whether `play` is currently accepted.
    pub can_play: bool,
    /// Whether `rest` is currently accepted.
    pub can_rest: bool,
    /// When the creature was last fed.
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    #[ts(type = "number | null")]
    pub last_fed: Option<DateTime<Utc>>,
    /// When the creature last played.
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    #[ts(type = "number | null")]
    pub last_played: Option<DateTime<Utc>>,
    /// When the creature last rested.
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    #[ts(type = "number | null")]
    pub last_rested: Option<DateTime<Utc>>,
    /// Whole seconds until `feed` is accepted again (0 when available).
    pub time_to_feed: u64,
    /// Whole seconds until `play` is accepted again (0 when available).
    pub time_to_play: u64,
    /// Whole seconds until `rest` is accepted again (0 when available).
    pub time_to_rest: u64,
    /// Number of decay ticks survived since the last restart.
    pub age: u64,
    /// Current level, starting at 1.
    pub level: u32,
}

impl CreatureSnapshot {
    /// Whether any vital has reached zero.
    pub const fn is_dead(&self) -> bool {
        self.hunger == 0 || self.happiness == 0 || self.energy == 0
    }
}
