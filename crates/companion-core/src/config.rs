//! Configuration loading and typed config structures for the Companion server.
//!
//! The canonical configuration lives in `companion-config.yaml`. Every field
//! has a default, so an empty or missing file yields the reference game:
//! vitals start at 50, decay removes 2 points every 1.5 s, actions cool
//! down for 15 s and a level takes 30 s of good health.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but describes an impossible game.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// What is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level server configuration.
///
/// Mirrors the structure of `companion-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CompanionConfig {
    /// Starting values for a fresh creature.
    #[serde(default)]
    pub creature: CreatureConfig,

    /// Decay scheduler timing and strength.
    #[serde(default)]
    pub decay: DecayConfig,

    /// Action effects and cooldowns.
    #[serde(default)]
    pub actions: ActionsConfig,

    /// Level promotion settings.
    #[serde(default)]
    pub level: LevelConfig,

    /// Broadcast heartbeat and per-observer buffering.
    #[serde(default)]
    pub broadcast: BroadcastConfig,

    /// HTTP/WebSocket bind address.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Optional RNG seed for reproducible runs. Unset means OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl CompanionConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override the bind address:
    /// - `COMPANION_HOST` overrides `server.host`
    /// - `COMPANION_PORT` overrides `server.port`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.server.apply_env_overrides();
        Ok(config)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// An empty document yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the cross-field constraints serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| {
            Err(ConfigError::Invalid {
                reason: reason.to_owned(),
            })
        };

        if self.creature.vital_max == 0 {
            return invalid("creature.vital_max must be at least 1");
        }
        if self.creature.initial_vital > self.creature.vital_max {
            return invalid("creature.initial_vital must not exceed creature.vital_max");
        }
        if self.decay.interval_ms == 0 {
            return invalid("decay.interval_ms must be at least 1");
        }
        if self.actions.cooldown_ms == 0 {
            return invalid("actions.cooldown_ms must be at least 1");
        }
        if self.actions.feed_hunger_min > self.actions.feed_hunger_max {
            return invalid("actions.feed_hunger_min must not exceed actions.feed_hunger_max");
        }
        if self.level.probation_ms == 0 {
            return invalid("level.probation_ms must be at least 1");
        }
        if self.broadcast.heartbeat_interval_ms == 0 {
            return invalid("broadcast.heartbeat_interval_ms must be at least 1");
        }
        if self.broadcast.observer_buffer == 0 {
            return invalid("broadcast.observer_buffer must be at least 1");
        }
        Ok(())
    }
}

/// Fresh-creature configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatureConfig {
    /// Value every vital starts at (and returns to on restart).
    #[serde(default = "default_initial_vital")]
    pub initial_vital: u32,

    /// Upper clamp bound for every vital.
    #[serde(default = "default_vital_max")]
    pub vital_max: u32,
}

impl Default for CreatureConfig {
    fn default() -> Self {
        Self {
            initial_vital: default_initial_vital(),
            vital_max: default_vital_max(),
        }
    }
}

/// Decay scheduler configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DecayConfig {
    /// Milliseconds between decay ticks.
    #[serde(default = "default_decay_interval_ms")]
    pub interval_ms: u64,

    /// Points removed from the chosen vital per tick.
    #[serde(default = "default_decay_amount")]
    pub amount: u32,
}

impl DecayConfig {
    /// The decay period as a [`Duration`].
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_decay_interval_ms(),
            amount: default_decay_amount(),
        }
    }
}

/// Action effect and cooldown configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ActionsConfig {
    /// Milliseconds an action stays unavailable after it is performed.
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,

    /// Lower bound (inclusive) of the hunger gained by feeding.
    #[serde(default = "default_feed_hunger_min")]
    pub feed_hunger_min: u32,

    /// Upper bound (inclusive) of the hunger gained by feeding.
    #[serde(default = "default_feed_hunger_max")]
    pub feed_hunger_max: u32,

    /// Happiness gained by feeding.
    #[serde(default = "default_feed_happiness")]
    pub feed_happiness: u32,

    /// Happiness gained by playing.
    #[serde(default = "default_play_happiness")]
    pub play_happiness: u32,

    /// Energy spent by playing.
    #[serde(default = "default_play_energy_cost")]
    pub play_energy_cost: u32,

    /// Energy gained by resting.
    #[serde(default = "default_rest_energy")]
    pub rest_energy: u32,

    /// Happiness lost by resting.
    #[serde(default = "default_rest_happiness_cost")]
    pub rest_happiness_cost: u32,
}

impl ActionsConfig {
    /// The cooldown window as a [`Duration`].
    pub const fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

impl Default for ActionsConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: default_cooldown_ms(),
            feed_hunger_min: default_feed_hunger_min(),
            feed_hunger_max: default_feed_hunger_max(),
            feed_happiness: default_feed_happiness(),
            play_happiness: default_play_happiness(),
            play_energy_cost: default_play_energy_cost(),
            rest_energy: default_rest_energy(),
            rest_happiness_cost: default_rest_happiness_cost(),
        }
    }
}

/// Level promotion configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LevelConfig {
    /// Milliseconds all vitals must stay positive before a promotion.
    #[serde(default = "default_probation_ms")]
    pub probation_ms: u64,
}

impl LevelConfig {
    /// The probation window as a [`Duration`].
    pub const fn probation(&self) -> Duration {
        Duration::from_millis(self.probation_ms)
    }
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            probation_ms: default_probation_ms(),
        }
    }
}

/// Broadcast configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BroadcastConfig {
    /// Milliseconds between unconditional heartbeat broadcasts.
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,

    /// Frames buffered per observer before new ones are skipped.
    #[serde(default = "default_observer_buffer")]
    pub observer_buffer: usize,
}

impl BroadcastConfig {
    /// The heartbeat period as a [`Duration`].
    pub const fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            observer_buffer: default_observer_buffer(),
        }
    }
}

/// Network bind configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerConfig {
    /// Override the bind address with environment variables when set.
    ///
    /// An unparseable `COMPANION_PORT` is ignored with a warning.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("COMPANION_HOST") {
            self.host = val;
        }
        if let Ok(val) = std::env::var("COMPANION_PORT") {
            match val.parse() {
                Ok(port) => self.port = port,
                Err(e) => {
                    tracing::warn!(value = %val, error = %e, "ignoring invalid COMPANION_PORT");
                }
            }
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level used when `RUST_LOG` is unset (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_initial_vital() -> u32 {
    50
}

const fn default_vital_max() -> u32 {
    100
}

const fn default_decay_interval_ms() -> u64 {
    1_500
}

const fn default_decay_amount() -> u32 {
    2
}

const fn default_cooldown_ms() -> u64 {
    15_000
}

const fn default_feed_hunger_min() -> u32 {
    5
}

const fn default_feed_hunger_max() -> u32 {
    15
}

const fn default_feed_happiness() -> u32 {
    5
}

const fn default_play_happiness() -> u32 {
    10
}

const fn default_play_energy_cost() -> u32 {
    5
}

const fn default_rest_energy() -> u32 {
    10
}

const fn default_rest_happiness_cost() -> u32 {
    5
}

const fn default_probation_ms() -> u64 {
    30_000
}

const fn default_heartbeat_interval_ms() -> u64 {
    1_000
}

const fn default_observer_buffer() -> usize {
    32
}

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    5000
}

fn default_log_level() -> String {
    "info".to_owned()
}
