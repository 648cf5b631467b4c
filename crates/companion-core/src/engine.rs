//! The companion engine: one creature, one lock, many timers.
//!
//! [`Companion`] owns the creature, its timer slots and its RNG behind a
//! single [`tokio::sync::Mutex`]. Every mutation (decay tick, player
//! action, cooldown expiry, level promotion, restart) holds that lock for
//! its whole sequence and publishes the resulting snapshot before
//! releasing it, so observers see states in the exact order they were
//! reached and never an intermediate one.
//!
//! Cooldowns and the level probation are spawned tasks that sleep, then
//! re-enter through the lock carrying a [`TimerToken`]. A task whose token
//! no longer matches its slot (because `restart` cleared it) does nothing.

use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::Utc;
use companion_types::{ActionKind, CreatureSnapshot, Vital};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::{CompanionConfig, ConfigError};
use crate::creature::Creature;
use crate::error::CompanionError;
use crate::level::{self, LevelTransition};
use crate::timers::{ScheduledTask, TimerToken, Timers};
use crate::vitals;

/// Destination for snapshots published by the engine.
///
/// Called while the state lock is held, so implementations must not
/// block. Returns the number of observers the snapshot was delivered to.
pub trait SnapshotSink: Send + Sync {
    /// Deliver `snapshot` to every current observer.
    fn publish(&self, snapshot: &CreatureSnapshot) -> usize;
}

/// What happened to a [`Companion::perform`] request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The effect was applied and the cooldown armed.
    Applied,
    /// The action was on cooldown; nothing changed.
    Ignored,
    /// The creature was replaced with a fresh one.
    Restarted,
}

struct Inner {
    creature: Creature,
    timers: Timers,
    rng: StdRng,
}

impl Inner {
    fn project(&self) -> CreatureSnapshot {
        let now = Instant::now();
        self.creature
            .snapshot(|kind| self.timers.cooldown_seconds(kind, now))
    }
}

/// The shared creature and everything that mutates it.
pub struct Companion {
    inner: Mutex<Inner>,
    config: CompanionConfig,
    sink: Arc<dyn SnapshotSink>,
}

impl Companion {
    /// Create the engine with a fresh creature.
    ///
    /// The RNG is seeded from `config.seed` when set, from OS entropy
    /// otherwise. Nothing is scheduled yet; see
    /// [`spawn_schedulers`](crate::scheduler::spawn_schedulers).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `config` fails
    /// [`CompanionConfig::validate`].
    pub fn new(
        config: CompanionConfig,
        sink: Arc<dyn SnapshotSink>,
    ) -> Result<Arc<Self>, ConfigError> {
        config.validate()?;
        let rng = config
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        let creature = Creature::new(&config.creature);
        Ok(Arc::new(Self {
            inner: Mutex::new(Inner {
                creature,
                timers: Timers::default(),
                rng,
            }),
            config,
            sink,
        }))
    }

    /// The configuration the engine was built with.
    pub const fn config(&self) -> &CompanionConfig {
        &self.config
    }

    /// Current public snapshot.
    pub async fn snapshot(&self) -> CreatureSnapshot {
        self.inner.lock().await.project()
    }

    /// Run `f` against the current snapshot while holding the state lock.
    ///
    /// No mutation or broadcast can interleave with `f`, so an observer
    /// registered inside it receives its first frame and every later one
    /// in order.
    pub async fn observe<T>(&self, f: impl FnOnce(&CreatureSnapshot) -> T) -> T {
        let inner = self.inner.lock().await;
        f(&inner.project())
    }

    /// Publish the current snapshot to every observer.
    ///
    /// Returns the number of observers reached.
    pub async fn broadcast(&self) -> usize {
        let inner = self.inner.lock().await;
        self.publish(&inner)
    }

    /// Process a player action.
    ///
    /// Gated actions on cooldown are ignored rather than rejected. Every
    /// `Ok` outcome, including [`ActionOutcome::Ignored`], is followed by a
    /// broadcast. On `Err` the creature is unchanged and nothing is
    /// published.
    pub async fn perform(
        self: &Arc<Self>,
        kind: ActionKind,
    ) -> Result<ActionOutcome, CompanionError> {
        let mut inner = self.inner.lock().await;

        let outcome = if kind == ActionKind::Restart {
            self.restart(&mut inner);
            ActionOutcome::Restarted
        } else if !inner.creature.can(kind) {
            debug!(action = %kind, "action on cooldown, ignoring");
            ActionOutcome::Ignored
        } else {
            let mut next = inner.creature;
            vitals::apply_action(
                &mut next,
                kind,
                &self.config.actions,
                &mut inner.rng,
                Utc::now(),
            )?;
            inner.creature = next;
            self.arm_cooldown(&mut inner, kind);
            info!(
                action = %kind,
                hunger = next.vital(Vital::Hunger),
                happiness = next.vital(Vital::Happiness),
                energy = next.vital(Vital::Energy),
                "action applied"
            );
            self.evaluate(&mut inner);
            ActionOutcome::Applied
        };

        self.publish(&inner);
        Ok(outcome)
    }

    /// Run one decay tick followed by a level evaluation.
    ///
    /// Returns the vital that was lowered.
    pub async fn decay_tick(self: &Arc<Self>) -> Result<Vital, CompanionError> {
        let mut inner = self.inner.lock().await;

        let target = vitals::choose_decay_target(&mut inner.rng);
        let mut next = inner.creature;
        vitals::apply_decay(&mut next, target, self.config.decay.amount)?;

        let died = !inner.creature.is_dead() && next.is_dead();
        inner.creature = next;
        if died {
            warn!(
                vital = %target,
                level = next.level(),
                age = next.age(),
                "creature has died"
            );
        }
        debug!(vital = %target, value = next.vital(target), "decay tick");

        self.evaluate(&mut inner);
        self.publish(&inner);
        Ok(target)
    }

    fn publish(&self, inner: &Inner) -> usize {
        self.sink.publish(&inner.project())
    }

    fn restart(&self, inner: &mut Inner) {
        inner.timers.cancel_all();
        inner.creature = Creature::new(&self.config.creature);
        info!("creature restarted");
    }

    fn evaluate(self: &Arc<Self>, inner: &mut Inner) {
        match level::next_transition(&inner.creature, inner.timers.promotion_armed()) {
            LevelTransition::Arm => {
                let probation = self.config.level.probation();
                let token = inner.timers.issue_token();
                let task = self.schedule(token, probation, |engine, token| async move {
                    engine.fire_promotion(token).await;
                });
                inner.timers.install_promotion(task);
                debug!(probation_ms = self.config.level.probation_ms, "level promotion armed");
            }
            LevelTransition::Cancel => {
                inner.timers.cancel_promotion();
                info!("level promotion cancelled, a vital reached zero");
            }
            LevelTransition::Hold => {}
        }
    }

    fn arm_cooldown(self: &Arc<Self>, inner: &mut Inner, kind: ActionKind) {
        let token = inner.timers.issue_token();
        let delay = self.config.actions.cooldown();
        let task = self.schedule(token, delay, move |engine, token| async move {
            engine.expire_cooldown(kind, token).await;
        });
        inner.timers.install_cooldown(kind, task);
    }

    /// Spawn `fire` after `delay`. The task only holds a weak reference,
    /// so a dropped engine lets its timers lapse.
    fn schedule<F, Fut>(
        self: &Arc<Self>,
        token: TimerToken,
        delay: Duration,
        fire: F,
    ) -> ScheduledTask
    where
        F: FnOnce(Arc<Self>, TimerToken) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let engine: Weak<Self> = Arc::downgrade(self);
        let now = Instant::now();
        let deadline = now.checked_add(delay).unwrap_or(now);
        let handle = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if let Some(engine) = engine.upgrade() {
                fire(engine, token).await;
            }
        });
        ScheduledTask::new(token, deadline, handle.abort_handle())
    }

    async fn expire_cooldown(&self, kind: ActionKind, token: TimerToken) {
        let mut inner = self.inner.lock().await;
        if !inner.timers.cooldown_matches(kind, token) {
            debug!(action = %kind, "stale cooldown expiry, ignoring");
            return;
        }
        inner.timers.release_cooldown(kind);
        inner.creature.set_available(kind, true);
        debug!(action = %kind, "cooldown expired");
        self.publish(&inner);
    }

    async fn fire_promotion(&self, token: TimerToken) {
        let mut inner = self.inner.lock().await;
        if !inner.timers.promotion_matches(token) {
            debug!("stale level promotion, ignoring");
            return;
        }
        inner.timers.release_promotion();

        let mut next = inner.creature;
        match level::promote_if_healthy(&mut next) {
            Ok(Some(new_level)) => {
                inner.creature = next;
                info!(level = new_level, "level up");
                self.publish(&inner);
            }
            Ok(None) => debug!("probation ended with a zero vital, no promotion"),
            Err(e) => warn!(error = %e, "level promotion failed"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::Rng;

    use super::*;
    use crate::testing::RecordingSink;

    fn seeded_config() -> CompanionConfig {
        CompanionConfig {
            seed: Some(7),
            ..CompanionConfig::default()
        }
    }

    fn engine() -> (Arc<Companion>, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let engine =
            Companion::new(seeded_config(), Arc::clone(&sink) as Arc<dyn SnapshotSink>).unwrap();
        (engine, sink)
    }

    async fn evaluate_level(engine: &Arc<Companion>) {
        let mut inner = engine.inner.lock().await;
        engine.evaluate(&mut inner);
    }

    async fn set_vital(engine: &Companion, vital: Vital, value: u32) {
        engine.inner.lock().await.creature.set_vital(vital, value);
    }

    async fn sleep_ms(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    fn vitals(s: &CreatureSnapshot) -> [u32; 3] {
        [s.hunger, s.happiness, s.energy]
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = seeded_config();
        config.actions.feed_hunger_min = 20;
        config.actions.feed_hunger_max = 10;
        let err = Companion::new(config, Arc::new(RecordingSink::default())).err().unwrap();
        assert!(matches!(err, ConfigError::Invalid { .. }));

        let mut config = seeded_config();
        config.decay.interval_ms = 0;
        assert!(Companion::new(config, Arc::new(RecordingSink::default())).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_engine_serves_defaults() {
        let (engine, sink) = engine();
        let snap = engine.snapshot().await;
        assert_eq!(vitals(&snap), [50, 50, 50]);
        assert!(snap.can_feed && snap.can_play && snap.can_rest);
        assert_eq!(snap.level, 1);
        assert_eq!(snap.age, 0);
        assert!(sink.frames().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn feed_scenario() {
        let (engine, _sink) = engine();

        let outcome = engine.perform(ActionKind::Feed).await.unwrap();
        assert_eq!(outcome, ActionOutcome::Applied);
        let after_first = engine.snapshot().await;
        assert!((55..=65).contains(&after_first.hunger));
        assert_eq!(after_first.happiness, 55);
        assert_eq!(after_first.energy, 50);
        assert!(!after_first.can_feed);
        assert!(after_first.last_fed.is_some());
        assert_eq!(after_first.time_to_feed, 15);

        sleep_ms(5_000).await;
        let outcome = engine.perform(ActionKind::Feed).await.unwrap();
        assert_eq!(outcome, ActionOutcome::Ignored);
        let after_second = engine.snapshot().await;
        assert_eq!(vitals(&after_second), vitals(&after_first));
        assert_eq!(after_second.last_fed, after_first.last_fed);
        assert!(!after_second.can_feed);
        assert_eq!(after_second.time_to_feed, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn observe_sees_current_state() {
        let (engine, _sink) = engine();
        engine.perform(ActionKind::Play).await.unwrap();
        let happiness = engine.observe(|snap| snap.happiness).await;
        assert_eq!(happiness, 60);
    }

    #[tokio::test(start_paused = true)]
    async fn ignored_action_still_broadcasts() {
        let (engine, sink) = engine();
        engine.perform(ActionKind::Play).await.unwrap();
        engine.perform(ActionKind::Play).await.unwrap();
        let frames = sink.frames();
        assert_eq!(frames.len(), 2);
        assert_eq!(vitals(&frames[0]), vitals(&frames[1]));
    }

    #[tokio::test(start_paused = true)]
    async fn cooldown_expiry_reenables_and_broadcasts() {
        let (engine, sink) = engine();
        engine.perform(ActionKind::Rest).await.unwrap();
        assert!(!engine.snapshot().await.can_rest);

        sleep_ms(14_900).await;
        assert!(!engine.snapshot().await.can_rest);

        sleep_ms(200).await;
        let snap = engine.snapshot().await;
        assert!(snap.can_rest);
        assert_eq!(snap.time_to_rest, 0);
        assert!(sink.last().unwrap().can_rest);

        let outcome = engine.perform(ActionKind::Rest).await.unwrap();
        assert_eq!(outcome, ActionOutcome::Applied);
    }

    #[tokio::test(start_paused = true)]
    async fn cooldowns_are_independent() {
        let (engine, _sink) = engine();
        engine.perform(ActionKind::Feed).await.unwrap();
        assert_eq!(engine.perform(ActionKind::Play).await.unwrap(), ActionOutcome::Applied);
        assert_eq!(engine.perform(ActionKind::Rest).await.unwrap(), ActionOutcome::Applied);
        let snap = engine.snapshot().await;
        assert!(!snap.can_feed && !snap.can_play && !snap.can_rest);
        // 50 + 5 (feed) + 10 (play) - 5 (rest)
        assert_eq!(snap.happiness, 60);
        // 50 - 5 (play) + 10 (rest)
        assert_eq!(snap.energy, 55);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_restores_defaults_without_cooldowns() {
        let (engine, sink) = engine();
        engine.perform(ActionKind::Feed).await.unwrap();
        engine.perform(ActionKind::Play).await.unwrap();
        engine.decay_tick().await.unwrap();

        let outcome = engine.perform(ActionKind::Restart).await.unwrap();
        assert_eq!(outcome, ActionOutcome::Restarted);
        let snap = engine.snapshot().await;
        let fresh = Creature::default().snapshot(|_| 0);
        assert_eq!(snap, fresh);
        assert_eq!(sink.last().unwrap(), fresh);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_cooldown_after_restart_does_not_reenable() {
        let (engine, _sink) = engine();
        engine.perform(ActionKind::Feed).await.unwrap();
        sleep_ms(5_000).await;
        engine.perform(ActionKind::Restart).await.unwrap();
        sleep_ms(1_000).await;
        engine.perform(ActionKind::Feed).await.unwrap();

        // The pre-restart cooldown would have expired at t=15s.
        sleep_ms(10_000).await;
        assert!(!engine.snapshot().await.can_feed);

        // The post-restart cooldown expires at t=21s.
        sleep_ms(5_100).await;
        assert!(engine.snapshot().await.can_feed);
    }

    #[tokio::test(start_paused = true)]
    async fn promotion_after_probation() {
        let (engine, sink) = engine();
        evaluate_level(&engine).await;

        sleep_ms(29_900).await;
        assert_eq!(engine.snapshot().await.level, 1);

        sleep_ms(200).await;
        assert_eq!(engine.snapshot().await.level, 2);
        assert_eq!(sink.last().unwrap().level, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_crossing_cancels_pending_promotion() {
        let (engine, _sink) = engine();
        evaluate_level(&engine).await;

        sleep_ms(29_000).await;
        set_vital(&engine, Vital::Hunger, 0).await;
        evaluate_level(&engine).await;
        // Recover without re-evaluating; the old window must stay cancelled.
        set_vital(&engine, Vital::Hunger, 50).await;

        sleep_ms(2_000).await;
        assert_eq!(engine.snapshot().await.level, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn promotion_rechecks_vitals_when_it_fires() {
        let (engine, _sink) = engine();
        evaluate_level(&engine).await;
        set_vital(&engine, Vital::Energy, 0).await;

        sleep_ms(30_100).await;
        assert_eq!(engine.snapshot().await.level, 1);
        assert!(!engine.inner.lock().await.timers.promotion_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn restart_cancels_pending_promotion() {
        let (engine, _sink) = engine();
        evaluate_level(&engine).await;

        sleep_ms(20_000).await;
        engine.perform(ActionKind::Restart).await.unwrap();
        evaluate_level(&engine).await;

        // The old window would have fired at t=30s.
        sleep_ms(11_000).await;
        assert_eq!(engine.snapshot().await.level, 1);

        // The new one fires at t=50s.
        sleep_ms(19_100).await;
        assert_eq!(engine.snapshot().await.level, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn decay_ticks_change_exactly_one_vital() {
        let (engine, sink) = engine();
        let mut previous = engine.snapshot().await;
        for tick in 1..=3 {
            let target = engine.decay_tick().await.unwrap();
            let current = engine.snapshot().await;
            let changed: Vec<_> = vitals(&previous)
                .iter()
                .zip(vitals(&current).iter())
                .filter(|(a, b)| a != b)
                .map(|(a, b)| a - b)
                .collect();
            assert_eq!(changed, vec![2]);
            assert_eq!(
                engine.inner.lock().await.creature.vital(target),
                previous_value(&previous, target) - 2
            );
            assert_eq!(current.age, tick);
            previous = current;
        }
        assert_eq!(sink.frames().len(), 3);
    }

    fn previous_value(s: &CreatureSnapshot, vital: Vital) -> u32 {
        match vital {
            Vital::Hunger => s.hunger,
            Vital::Happiness => s.happiness,
            Vital::Energy => s.energy,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn decay_clamps_at_zero_and_keeps_running() {
        let (engine, _sink) = engine();
        for vital in Vital::ALL {
            set_vital(&engine, vital, 1).await;
        }
        for _ in 0..10 {
            engine.decay_tick().await.unwrap();
        }
        let snap = engine.snapshot().await;
        assert!(snap.is_dead());
        assert_eq!(snap.age, 10);
        // Actions stay available on a dead creature.
        assert_eq!(engine.perform(ActionKind::Feed).await.unwrap(), ActionOutcome::Applied);
    }

    #[tokio::test(start_paused = true)]
    async fn broadcast_matches_post_mutation_state() {
        let (engine, sink) = engine();
        engine.perform(ActionKind::Feed).await.unwrap();
        assert_eq!(sink.last().unwrap(), engine.snapshot().await);
        engine.decay_tick().await.unwrap();
        assert_eq!(sink.last().unwrap(), engine.snapshot().await);
        assert_eq!(engine.broadcast().await, 1);
        assert_eq!(sink.frames().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn vitals_stay_clamped_under_random_play() {
        let (engine, sink) = engine();
        let mut driver = StdRng::seed_from_u64(99);
        for _ in 0..300 {
            match driver.random_range(0..6) {
                0 => {
                    engine.perform(ActionKind::Feed).await.unwrap();
                }
                1 => {
                    engine.perform(ActionKind::Play).await.unwrap();
                }
                2 => {
                    engine.perform(ActionKind::Rest).await.unwrap();
                }
                3 => sleep_ms(4_000).await,
                _ => {
                    engine.decay_tick().await.unwrap();
                }
            }
        }
        for frame in sink.frames() {
            for value in vitals(&frame) {
                assert!(value <= 100);
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn failed_decay_leaves_state_untouched() {
        let (engine, sink) = engine();
        engine.inner.lock().await.creature.set_age(u64::MAX);
        let before = engine.snapshot().await;

        let err = engine.decay_tick().await.unwrap_err();
        assert!(matches!(err, CompanionError::ArithmeticOverflow { .. }));
        assert_eq!(engine.snapshot().await, before);
        assert!(sink.frames().is_empty());
    }
}
