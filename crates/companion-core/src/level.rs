//! Level evaluator state machine.
//!
//! The evaluator is either **Idle** or **Armed** (a probation timer is
//! running). Each evaluation compares the vitals against that state:
//!
//! | Vitals all > 0 | Armed | Transition |
//! |----------------|-------|------------|
//! | yes | no | arm a probation timer |
//! | no | yes | cancel the timer |
//! | otherwise | | hold |
//!
//! When the probation timer fires the vitals are checked once more; the
//! level only goes up if they are still all positive. Either way the
//! evaluator returns to Idle.

use crate::creature::Creature;
use crate::error::CompanionError;

/// What the engine should do with the promotion timer after an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelTransition {
    /// Idle and healthy: start the probation window.
    Arm,
    /// Armed but a vital hit zero: cancel without promoting.
    Cancel,
    /// Nothing changes.
    Hold,
}

/// Decide the transition for the current vitals and timer state.
pub const fn next_transition(creature: &Creature, armed: bool) -> LevelTransition {
    match (creature.all_vitals_positive(), armed) {
        (true, false) => LevelTransition::Arm,
        (false, true) => LevelTransition::Cancel,
        _ => LevelTransition::Hold,
    }
}

/// Handle an expired probation window.
///
/// Returns the new level if the creature was promoted, `None` if a vital
/// dropped to zero in the meantime.
pub fn promote_if_healthy(creature: &mut Creature) -> Result<Option<u32>, CompanionError> {
    if !creature.all_vitals_positive() {
        return Ok(None);
    }
    creature
        .level_up()
        .map(Some)
        .ok_or_else(|| CompanionError::overflow("level increment overflow"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use companion_types::Vital;

    use super::*;

    #[test]
    fn healthy_idle_arms() {
        let c = Creature::default();
        assert_eq!(next_transition(&c, false), LevelTransition::Arm);
    }

    #[test]
    fn healthy_armed_holds() {
        let c = Creature::default();
        assert_eq!(next_transition(&c, true), LevelTransition::Hold);
    }

    #[test]
    fn zero_vital_cancels_armed_timer() {
        let mut c = Creature::default();
        c.set_vital(Vital::Energy, 0);
        assert_eq!(next_transition(&c, true), LevelTransition::Cancel);
        assert_eq!(next_transition(&c, false), LevelTransition::Hold);
    }

    #[test]
    fn promotion_requires_healthy_vitals_on_fire() {
        let mut c = Creature::default();
        assert_eq!(promote_if_healthy(&mut c).unwrap(), Some(2));
        c.set_vital(Vital::Hunger, 0);
        assert_eq!(promote_if_healthy(&mut c).unwrap(), None);
        assert_eq!(c.level(), 2);
    }
}
