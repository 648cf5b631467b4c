//! The creature record and its clamping invariants.
//!
//! [`Creature`] is a small `Copy` value. Mutators work on a copy and the
//! engine commits it only once the whole mutation succeeded, so a failed
//! operation can never leave a half-applied state behind.

use chrono::{DateTime, SubsecRound, Utc};
use companion_types::{ActionKind, CreatureSnapshot, Vital};

use crate::config::CreatureConfig;

/// Mutable state of the single shared creature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Creature {
    hunger: u32,
    happiness: u32,
    energy: u32,
    vital_max: u32,
    can_feed: bool,
    can_play: bool,
    can_rest: bool,
    last_fed: Option<DateTime<Utc>>,
    last_played: Option<DateTime<Utc>>,
    last_rested: Option<DateTime<Utc>>,
    age: u64,
    level: u32,
}

impl Creature {
    /// Create a fresh creature: every vital at its initial value, level 1,
    /// every action available.
    pub fn new(config: &CreatureConfig) -> Self {
        let start = config.initial_vital.min(config.vital_max);
        Self {
            hunger: start,
            happiness: start,
            energy: start,
            vital_max: config.vital_max,
            can_feed: true,
            can_play: true,
            can_rest: true,
            last_fed: None,
            last_played: None,
            last_rested: None,
            age: 0,
            level: 1,
        }
    }

    /// Current value of a vital.
    pub const fn vital(&self, vital: Vital) -> u32 {
        match vital {
            Vital::Hunger => self.hunger,
            Vital::Happiness => self.happiness,
            Vital::Energy => self.energy,
        }
    }

    /// Set a vital, clamping into `[0, vital_max]`.
    pub fn set_vital(&mut self, vital: Vital, value: u32) {
        let clamped = value.min(self.vital_max);
        match vital {
            Vital::Hunger => self.hunger = clamped,
            Vital::Happiness => self.happiness = clamped,
            Vital::Energy => self.energy = clamped,
        }
    }

    /// Raise a vital, saturating at `vital_max`.
    pub fn raise(&mut self, vital: Vital, amount: u32) {
        self.set_vital(vital, self.vital(vital).saturating_add(amount));
    }

    /// Lower a vital, saturating at zero.
    pub fn lower(&mut self, vital: Vital, amount: u32) {
        self.set_vital(vital, self.vital(vital).saturating_sub(amount));
    }

    /// Whether hunger, happiness and energy are all strictly positive.
    pub const fn all_vitals_positive(&self) -> bool {
        self.hunger > 0 && self.happiness > 0 && self.energy > 0
    }

    /// Whether any vital has hit zero.
    pub const fn is_dead(&self) -> bool {
        !self.all_vitals_positive()
    }

    /// Whether `kind` is currently allowed. `restart` always is.
    pub const fn can(&self, kind: ActionKind) -> bool {
        match kind {
            ActionKind::Feed => self.can_feed,
            ActionKind::Play => self.can_play,
            ActionKind::Rest => self.can_rest,
            ActionKind::Restart => true,
        }
    }

    /// Open or close the cooldown gate for `kind`. No-op for `restart`.
    pub const fn set_available(&mut self, kind: ActionKind, available: bool) {
        match kind {
            ActionKind::Feed => self.can_feed = available,
            ActionKind::Play => self.can_play = available,
            ActionKind::Rest => self.can_rest = available,
            ActionKind::Restart => {}
        }
    }

    /// Record that `kind` succeeded at `at`. No-op for `restart`.
    ///
    /// Stored at millisecond precision, the resolution snapshots carry on
    /// the wire.
    pub fn record(&mut self, kind: ActionKind, at: DateTime<Utc>) {
        let at = at.trunc_subsecs(3);
        match kind {
            ActionKind::Feed => self.last_fed = Some(at),
            ActionKind::Play => self.last_played = Some(at),
            ActionKind::Rest => self.last_rested = Some(at),
            ActionKind::Restart => {}
        }
    }

    /// Last time `kind` succeeded.
    pub const fn last(&self, kind: ActionKind) -> Option<DateTime<Utc>> {
        match kind {
            ActionKind::Feed => self.last_fed,
            ActionKind::Play => self.last_played,
            ActionKind::Rest => self.last_rested,
            ActionKind::Restart => None,
        }
    }

    /// Decay ticks survived since creation.
    pub const fn age(&self) -> u64 {
        self.age
    }

    /// Increment the age counter.
    ///
    /// Returns `None` on overflow, leaving the age untouched.
    pub fn grow_older(&mut self) -> Option<u64> {
        self.age = self.age.checked_add(1)?;
        Some(self.age)
    }

    #[cfg(test)]
    pub(crate) const fn set_age(&mut self, age: u64) {
        self.age = age;
    }

    /// Current level.
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Increment the level.
    ///
    /// Returns `None` on overflow, leaving the level untouched.
    pub fn level_up(&mut self) -> Option<u32> {
        self.level = self.level.checked_add(1)?;
        Some(self.level)
    }

    /// Build the public projection.
    ///
    /// `time_to` reports the whole seconds left on each action's cooldown.
    pub fn snapshot(&self, time_to: impl Fn(ActionKind) -> u64) -> CreatureSnapshot {
        CreatureSnapshot {
            hunger: self.hunger,
            happiness: self.happiness,
            energy: self.energy,
            can_feed: self.can_feed,
            can_play: self.can_play,
            can_rest: self.can_rest,
            last_fed: self.last_fed,
            last_played: self.last_played,
            last_rested: self.last_rested,
            time_to_feed: time_to(ActionKind::Feed),
            time_to_play: time_to(ActionKind::Play),
            time_to_rest: time_to(ActionKind::Rest),
            age: self.age,
            level: self.level,
        }
    }
}

impl Default for Creature {
    fn default() -> Self {
        Self::new(&CreatureConfig::default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn fresh_creature_has_reference_defaults() {
        let c = Creature::default();
        for vital in Vital::ALL {
            assert_eq!(c.vital(vital), 50);
        }
        assert_eq!(c.level(), 1);
        assert_eq!(c.age(), 0);
        for kind in ActionKind::ALL {
            assert!(c.can(kind));
            assert!(c.last(kind).is_none());
        }
    }

    #[test]
    fn set_vital_clamps_high() {
        let mut c = Creature::default();
        c.set_vital(Vital::Energy, 250);
        assert_eq!(c.vital(Vital::Energy), 100);
    }

    #[test]
    fn raise_and_lower_saturate() {
        let mut c = Creature::default();
        c.raise(Vital::Hunger, u32::MAX);
        assert_eq!(c.vital(Vital::Hunger), 100);
        c.lower(Vital::Hunger, 500);
        assert_eq!(c.vital(Vital::Hunger), 0);
    }

    #[test]
    fn dead_when_any_vital_is_zero() {
        let mut c = Creature::default();
        assert!(!c.is_dead());
        c.set_vital(Vital::Happiness, 0);
        assert!(c.is_dead());
        assert!(!c.all_vitals_positive());
    }

    #[test]
    fn restart_is_never_gated() {
        let mut c = Creature::default();
        c.set_available(ActionKind::Restart, false);
        assert!(c.can(ActionKind::Restart));
    }

    #[test]
    fn snapshot_carries_cooldown_timers() {
        let mut c = Creature::default();
        c.set_available(ActionKind::Play, false);
        let snap = c.snapshot(|kind| if kind == ActionKind::Play { 9 } else { 0 });
        assert!(!snap.can_play);
        assert_eq!(snap.time_to_play, 9);
        assert_eq!(snap.time_to_feed, 0);
        assert_eq!(snap.level, 1);
    }

    #[test]
    fn level_and_age_overflow_are_detected() {
        let mut c = Creature::default();
        c.level = u32::MAX;
        assert!(c.level_up().is_none());
        assert_eq!(c.level(), u32::MAX);
        c.age = u64::MAX;
        assert!(c.grow_older().is_none());
    }

    #[test]
    fn recorded_times_are_truncated_to_milliseconds() {
        let mut c = Creature::default();
        let at = Utc.timestamp_opt(1_700_000_000, 297_185_510).unwrap();
        c.record(ActionKind::Feed, at);
        let stored = c.last(ActionKind::Feed).unwrap();
        assert_eq!(stored.timestamp_subsec_nanos(), 297_000_000);
        assert_eq!(stored.timestamp(), 1_700_000_000);
    }

    #[test]
    fn snapshot_survives_the_wire_unchanged() {
        let mut c = Creature::default();
        let at = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
        c.record(ActionKind::Feed, at);
        c.record(ActionKind::Play, at);
        c.record(ActionKind::Rest, at);
        let snap = c.snapshot(|_| 3);

        let json = serde_json::to_string(&snap).unwrap();
        let read_back: CreatureSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(read_back, snap);
    }
}
