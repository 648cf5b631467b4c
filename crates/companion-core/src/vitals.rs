//! Vital mechanics: decay and the effects of player actions.
//!
//! Everything here is a pure function over a [`Creature`] and an RNG, so
//! the engine can apply it to a scratch copy and commit afterwards.
//!
//! - Decay lowers one uniformly chosen vital by a fixed amount
//! - Feed raises hunger by a random amount and happiness by a fixed one
//! - Play trades energy for happiness
//! - Rest trades happiness for energy
//!
//! All arithmetic saturates inside the clamp range. No panics.

use chrono::{DateTime, Utc};
use companion_types::{ActionKind, Vital};
use rand::Rng;
use rand::seq::IndexedRandom;

use crate::config::ActionsConfig;
use crate::creature::Creature;
use crate::error::CompanionError;

/// Pick the vital a decay tick will lower, uniformly at random.
pub fn choose_decay_target<R: Rng + ?Sized>(rng: &mut R) -> Vital {
    Vital::ALL.choose(rng).copied().unwrap_or(Vital::Hunger)
}

/// Apply one decay tick to `vital` and age the creature.
pub fn apply_decay(
    creature: &mut Creature,
    vital: Vital,
    amount: u32,
) -> Result<(), CompanionError> {
    creature.lower(vital, amount);
    creature
        .grow_older()
        .ok_or_else(|| CompanionError::overflow("age increment overflow"))?;
    Ok(())
}

/// Apply the effect of a gated action and close its cooldown gate.
///
/// The caller has already checked that the action is available.
/// `restart` is not an effect and is rejected.
pub fn apply_action<R: Rng + ?Sized>(
    creature: &mut Creature,
    kind: ActionKind,
    config: &ActionsConfig,
    rng: &mut R,
    now: DateTime<Utc>,
) -> Result<(), CompanionError> {
    match kind {
        ActionKind::Feed => {
            let gain = rng.random_range(config.feed_hunger_min..=config.feed_hunger_max);
            creature.raise(Vital::Hunger, gain);
            creature.raise(Vital::Happiness, config.feed_happiness);
        }
        ActionKind::Play => {
            creature.raise(Vital::Happiness, config.play_happiness);
            creature.lower(Vital::Energy, config.play_energy_cost);
        }
        ActionKind::Rest => {
            creature.raise(Vital::Energy, config.rest_energy);
            creature.lower(Vital::Happiness, config.rest_happiness_cost);
        }
        ActionKind::Restart => return Err(CompanionError::UnsupportedAction { kind }),
    }
    creature.record(kind, now);
    creature.set_available(kind, false);
    Ok(())
}
