//! Recurring loops that keep the creature alive on screen.
//!
//! Two independent loops drive the engine:
//!
//! - **Decay**: every `decay.interval_ms`, one vital drops and the level
//!   evaluator runs ([`Companion::decay_tick`]).
//! - **Heartbeat**: every `broadcast.heartbeat_interval_ms`, the current
//!   snapshot is pushed to everyone ([`Companion::broadcast`]) so an
//!   observer that missed an event converges within one period.
//!
//! Neither loop ever stops on error; failures are logged and the next
//! period runs as usual.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::engine::Companion;

/// Handles to the running loops.
#[derive(Debug)]
pub struct SchedulerHandles {
    decay: JoinHandle<()>,
    heartbeat: JoinHandle<()>,
}

impl SchedulerHandles {
    /// Stop both loops. Pending cooldown and promotion timers are left to
    /// lapse on their own.
    pub fn shutdown(self) {
        self.decay.abort();
        self.heartbeat.abort();
        info!("schedulers stopped");
    }
}

/// Spawn the decay and heartbeat loops on the current runtime.
pub fn spawn_schedulers(engine: &Arc<Companion>) -> SchedulerHandles {
    let decay = tokio::spawn(run_decay_loop(Arc::clone(engine)));
    let heartbeat = tokio::spawn(run_heartbeat_loop(Arc::clone(engine)));
    info!(
        decay_interval_ms = engine.config().decay.interval_ms,
        heartbeat_interval_ms = engine.config().broadcast.heartbeat_interval_ms,
        "schedulers started"
    );
    SchedulerHandles { decay, heartbeat }
}

/// Run decay ticks forever. The first tick fires one period after start.
pub async fn run_decay_loop(engine: Arc<Companion>) {
    let mut ticker = periodic(engine.config().decay.interval());
    loop {
        ticker.tick().await;
        match engine.decay_tick().await {
            Ok(vital) => debug!(%vital, "decay applied"),
            Err(e) => warn!(error = %e, "decay tick failed, continuing"),
        }
    }
}

/// Broadcast the current snapshot forever, one period apart.
pub async fn run_heartbeat_loop(engine: Arc<Companion>) {
    let mut ticker = periodic(engine.config().broadcast.heartbeat_interval());
    loop {
        ticker.tick().await;
        let receivers = engine.broadcast().await;
        debug!(receivers, "heartbeat sent");
    }
}

/// `interval_at` rejects a zero period.
fn periodic(period: Duration) -> Interval {
    let period = period.max(Duration::from_millis(1));
    let now = Instant::now();
    let start = now.checked_add(period).unwrap_or(now);
    let mut ticker = tokio::time::interval_at(start, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}
