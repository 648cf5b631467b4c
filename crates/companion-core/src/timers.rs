//! Deferred, individually cancellable timer tasks.
//!
//! Cooldown expiries and the level probation run as their own Tokio tasks.
//! Each task is identified by a [`TimerToken`] stored in its slot; when the
//! task wakes it must present a token that still matches the slot before it
//! may touch the creature. Clearing or replacing a slot therefore turns any
//! older task into a no-op, even one that already woke and is waiting for
//! the state lock.

use std::time::Duration;

use companion_types::ActionKind;
use tokio::task::AbortHandle;
use tokio::time::Instant;

/// Identity of one scheduled timer task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

/// A spawned timer task and its deadline.
#[derive(Debug)]
pub struct ScheduledTask {
    token: TimerToken,
    deadline: Instant,
    handle: AbortHandle,
}

impl ScheduledTask {
    /// Wrap a spawned task.
    pub const fn new(token: TimerToken, deadline: Instant, handle: AbortHandle) -> Self {
        Self {
            token,
            deadline,
            handle,
        }
    }

    fn cancel(self) {
        self.handle.abort();
    }
}

/// Timer slots for the three cooldowns and the pending promotion.
#[derive(Debug, Default)]
pub struct Timers {
    next_token: u64,
    feed: Option<ScheduledTask>,
    play: Option<ScheduledTask>,
    rest: Option<ScheduledTask>,
    promotion: Option<ScheduledTask>,
}

impl Timers {
    /// Allocate a fresh token. Tokens are never reused within a run.
    pub const fn issue_token(&mut self) -> TimerToken {
        let token = TimerToken(self.next_token);
        self.next_token = self.next_token.wrapping_add(1);
        token
    }

    const fn cooldown_slot(&self, kind: ActionKind) -> Option<&Option<ScheduledTask>> {
        match kind {
            ActionKind::Feed => Some(&self.feed),
            ActionKind::Play => Some(&self.play),
            ActionKind::Rest => Some(&self.rest),
            ActionKind::Restart => None,
        }
    }

    const fn cooldown_slot_mut(&mut self, kind: ActionKind) -> Option<&mut Option<ScheduledTask>> {
        match kind {
            ActionKind::Feed => Some(&mut self.feed),
            ActionKind::Play => Some(&mut self.play),
            ActionKind::Rest => Some(&mut self.rest),
            ActionKind::Restart => None,
        }
    }

    /// Install the cooldown task for `kind`, cancelling any previous one.
    pub fn install_cooldown(&mut self, kind: ActionKind, task: ScheduledTask) {
        match self.cooldown_slot_mut(kind) {
            Some(slot) => {
                if let Some(old) = slot.replace(task) {
                    old.cancel();
                }
            }
            None => task.cancel(),
        }
    }

    /// Whether `token` is the live cooldown task for `kind`.
    pub fn cooldown_matches(&self, kind: ActionKind, token: TimerToken) -> bool {
        self.cooldown_slot(kind)
            .and_then(Option::as_ref)
            .is_some_and(|task| task.token == token)
    }

    /// Empty the cooldown slot for `kind` without aborting the task.
    ///
    /// Used by the task itself once it has fired.
    pub fn release_cooldown(&mut self, kind: ActionKind) {
        if let Some(slot) = self.cooldown_slot_mut(kind) {
            *slot = None;
        }
    }

    /// Time left on the cooldown for `kind`, zero when none is running.
    pub fn cooldown_remaining(&self, kind: ActionKind, now: Instant) -> Duration {
        self.cooldown_slot(kind)
            .and_then(Option::as_ref)
            .map_or(Duration::ZERO, |task| task.deadline.saturating_duration_since(now))
    }

    /// Whole seconds left on the cooldown for `kind`, rounded up.
    pub fn cooldown_seconds(&self, kind: ActionKind, now: Instant) -> u64 {
        let remaining = self.cooldown_remaining(kind, now);
        if remaining.subsec_nanos() > 0 {
            remaining.as_secs().saturating_add(1)
        } else {
            remaining.as_secs()
        }
    }

    /// Whether a level promotion is armed.
    pub const fn promotion_armed(&self) -> bool {
        self.promotion.is_some()
    }

    /// Install the probation task, cancelling any previous one.
    pub fn install_promotion(&mut self, task: ScheduledTask) {
        if let Some(old) = self.promotion.replace(task) {
            old.cancel();
        }
    }

    /// Whether `token` is the live probation task.
    pub fn promotion_matches(&self, token: TimerToken) -> bool {
        self.promotion.as_ref().is_some_and(|task| task.token == token)
    }

    /// Empty the promotion slot without aborting the task.
    pub fn release_promotion(&mut self) {
        self.promotion = None;
    }

    /// Abort the pending promotion, if any.
    ///
    /// Returns `true` if a promotion was pending.
    pub fn cancel_promotion(&mut self) -> bool {
        self.promotion.take().map(ScheduledTask::cancel).is_some()
    }

    /// Abort every outstanding timer.
    pub fn cancel_all(&mut self) {
        for task in [
            self.feed.take(),
            self.play.take(),
            self.rest.take(),
            self.promotion.take(),
        ]
        .into_iter()
        .flatten()
        {
            task.cancel();
        }
    }
}
