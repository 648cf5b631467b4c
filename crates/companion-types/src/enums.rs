//! Enumeration types for the Companion simulation.

use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// An action an observer can ask the server to perform on the creature.
///
/// The set is closed. Wire names are the ones the mobile client has
/// always sent (`nourrir`, `jouer`, `reposer`, `restart`); the English
/// names are accepted on input as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum ActionKind {
    /// Raise hunger satisfaction and a little happiness.
    #[serde(rename = "nourrir", alias = "feed")]
    Feed,
    /// Raise happiness at the cost of energy.
    #[serde(rename = "jouer", alias = "play")]
    Play,
    /// Raise energy at the cost of happiness.
    #[serde(rename = "reposer", alias = "rest")]
    Rest,
    /// Replace the creature with a fresh one.
    #[serde(rename = "restart")]
    Restart,
}

impl ActionKind {
    /// Every action kind, in declaration order.
    pub const ALL: [Self; 4] = [Self::Feed, Self::Play, Self::Rest, Self::Restart];
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Feed => "feed",
            Self::Play => "play",
            Self::Rest => "rest",
            Self::Restart => "restart",
        };
        f.write_str(name)
    }
}

/// One of the three clamped creature attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Vital {
    /// Satiety. Low means starving.
    Hunger,
    /// Mood.
    Happiness,
    /// Stamina.
    Energy,
}

impl Vital {
    /// The three vitals, in the order decay draws from.
    pub const ALL: [Self; 3] = [Self::Hunger, Self::Happiness, Self::Energy];
}

impl fmt::Display for Vital {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Hunger => "hunger",
            Self::Happiness => "happiness",
            Self::Energy => "energy",
        };
        f.write_str(name)
    }
}
