//! Creature state, decay, cooldowns, and leveling for the Companion simulation.
//!
//! This crate owns the single shared creature and every rule that changes
//! it. It knows nothing about HTTP; snapshots leave through the
//! [`SnapshotSink`] trait, which the server crate implements.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `companion-config.yaml`
//! - [`creature`] -- The creature record and its clamp invariants
//! - [`engine`] -- [`Companion`], the serialized mutation path and timers
//! - [`error`] -- [`CompanionError`]
//! - [`level`] -- Level evaluator state machine
//! - [`scheduler`] -- Decay and heartbeat loops
//! - [`timers`] -- Cancellable cooldown and probation task slots
//! - [`vitals`] -- Decay and action effects

pub mod config;
pub mod creature;
pub mod engine;
pub mod error;
pub mod level;
pub mod scheduler;
pub mod timers;
pub mod vitals;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{CompanionConfig, ConfigError};
pub use engine::{ActionOutcome, Companion, SnapshotSink};
pub use error::CompanionError;
pub use scheduler::{SchedulerHandles, spawn_schedulers};
