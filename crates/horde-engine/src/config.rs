//! World configuration: arena geometry, entity parameters, difficulty phases
//! and reward magnitudes.
//!
//! Every struct deserializes with `#[serde(default)]`, so a configuration file
//! only has to name the values it overrides. Durations are written as whole
//! milliseconds.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::geometry::{Size, Vec2};

/// One difficulty phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseConfig {
    pub name: String,
    /// Minimum time between two zombie spawns.
    #[serde(with = "millis")]
    pub spawn_delay: Duration,
    /// Zombie movement per tick, in world units.
    pub zombie_speed: f32,
    /// Time spent in this phase before the next one starts; `None` never ends.
    #[serde(default, with = "opt_millis")]
    pub duration: Option<Duration>,
}

impl PhaseConfig {
    #[must_use]
    pub fn new(name: &str, spawn_delay_ms: u64, zombie_speed: f32, duration_s: Option<u64>) -> Self {
        Self {
            name: name.to_owned(),
            spawn_delay: Duration::from_millis(spawn_delay_ms),
            zombie_speed,
            duration: duration_s.map(Duration::from_secs),
        }
    }
}

/// Reward contributions applied by a tick. Signs are part of the values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    pub survival: f64,
    pub shoot: f64,
    pub phase_bonus: f64,
    pub kill: f64,
    pub damage: f64,
    pub death: f64,
    /// Returned when `advance` is called on an episode that already ended.
    pub already_terminal: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            survival: 0.1,
            shoot: -0.1,
            phase_bonus: 5.0,
            kill: 10.0,
            damage: -20.0,
            death: -50.0,
            already_terminal: -50.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub width: f32,
    pub height: f32,
    /// Simulation ticks per second of game time.
    pub tick_rate: u32,
    pub player_size: f32,
    pub player_speed: f32,
    pub max_health: u8,
    pub zombie_size: f32,
    pub zombie_cap: usize,
    pub bullet_size: Size,
    pub bullet_speed: f32,
    pub phases: Vec<PhaseConfig>,
    pub rewards: RewardConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            tick_rate: 60,
            player_size: 40.0,
            player_speed: 5.0,
            max_health: 3,
            zombie_size: 40.0,
            zombie_cap: 20,
            bullet_size: Size::new(5.0, 10.0),
            bullet_speed: 7.0,
            phases: vec![
                PhaseConfig::new("Phase 1", 1500, 2.0, Some(60)),
                PhaseConfig::new("Phase 2", 1000, 3.0, Some(30)),
                PhaseConfig::new("Phase 3", 500, 4.0, None),
            ],
            rewards: RewardConfig::default(),
        }
    }
}

impl WorldConfig {
    /// Game time covered by one tick.
    #[must_use]
    pub fn tick_duration(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.tick_rate.max(1)))
    }

    #[must_use]
    pub fn player_start(&self) -> Vec2 {
        Vec2::new(
            (self.width - self.player_size) / 2.0,
            (self.height - self.player_size) / 2.0,
        )
    }

    #[must_use]
    pub fn phase_count(&self) -> usize {
        self.phases.len()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("width", self.width),
            ("height", self.height),
            ("player_size", self.player_size),
            ("player_speed", self.player_speed),
            ("zombie_size", self.zombie_size),
            ("bullet_size.width", self.bullet_size.width),
            ("bullet_size.height", self.bullet_size.height),
            ("bullet_speed", self.bullet_speed),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NotPositive { field });
            }
        }
        if self.tick_rate == 0 {
            return Err(ConfigError::NotPositive { field: "tick_rate" });
        }
        if self.player_size > self.width || self.player_size > self.height {
            return Err(ConfigError::PlayerTooLarge);
        }
        if self.max_health == 0 {
            return Err(ConfigError::NotPositive { field: "max_health" });
        }
        if self.phases.is_empty() {
            return Err(ConfigError::NoPhases);
        }
        if self.phases.len() > usize::from(u8::MAX) {
            return Err(ConfigError::TooManyPhases { count: self.phases.len() });
        }
        for (index, phase) in self.phases.iter().enumerate() {
            if !(phase.zombie_speed.is_finite() && phase.zombie_speed >= 0.0) {
                return Err(ConfigError::InvalidZombieSpeed { phase: index });
            }
            let is_last = index + 1 == self.phases.len();
            if phase.duration.is_none() && !is_last {
                return Err(ConfigError::UnboundedPhase { phase: index });
            }
        }
        let rewards = &self.rewards;
        let reward_values = [
            rewards.survival,
            rewards.shoot,
            rewards.phase_bonus,
            rewards.kill,
            rewards.damage,
            rewards.death,
            rewards.already_terminal,
        ];
        if reward_values.iter().any(|r| !r.is_finite()) {
            return Err(ConfigError::NonFiniteReward);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("`{field}` must be a positive finite value")]
    NotPositive { field: &'static str },
    #[display("player does not fit inside the world")]
    PlayerTooLarge,
    #[display("at least one phase is required")]
    NoPhases,
    #[display("too many phases ({count}), at most 255 are supported")]
    TooManyPhases { count: usize },
    #[display("phase {phase} has an invalid zombie speed")]
    InvalidZombieSpeed { phase: usize },
    #[display("only the last phase may have an unbounded duration (phase {phase})")]
    UnboundedPhase { phase: usize },
    #[display("reward values must be finite")]
    NonFiniteReward,
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize as _, Deserializer, Serializer};

    pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = u64::try_from(value.as_millis()).map_err(serde::ser::Error::custom)?;
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

mod opt_millis {
    use std::time::Duration;

    use serde::{Deserialize as _, Deserializer, Serializer};

    #[allow(clippy::ref_option)]
    pub fn serialize<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(duration) => {
                let millis =
                    u64::try_from(duration.as_millis()).map_err(serde::ser::Error::custom)?;
                serializer.serialize_some(&millis)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<u64>::deserialize(deserializer).map(|millis| millis.map(Duration::from_millis))
    }
}
