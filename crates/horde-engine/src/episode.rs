use std::time::Duration;

use crate::{
    config::WorldConfig,
    entity::{Bullet, Player, Zombie},
};

/// Snapshot of one episode's world.
///
/// Owned exclusively by [`Simulation`](crate::Simulation); other components only
/// ever see it by shared reference.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeState {
    pub(crate) player: Player,
    pub(crate) zombies: Vec<Zombie>,
    pub(crate) bullets: Vec<Bullet>,
    pub(crate) phase: usize,
    pub(crate) phase_clock: Duration,
    pub(crate) spawn_clock: Duration,
    pub(crate) elapsed: Duration,
    pub(crate) ticks: u64,
    pub(crate) score: u32,
    pub(crate) terminal: bool,
}

impl EpisodeState {
    /// Fresh episode: player centered at full health, empty arena, first phase.
    #[must_use]
    pub fn new(config: &WorldConfig) -> Self {
        Self {
            player: Player::new(config.player_start(), config.player_size, config.max_health),
            zombies: vec![],
            bullets: vec![],
            phase: 0,
            phase_clock: Duration::ZERO,
            spawn_clock: Duration::ZERO,
            elapsed: Duration::ZERO,
            ticks: 0,
            score: 0,
            terminal: false,
        }
    }

    #[must_use]
    pub fn player(&self) -> &Player {
        &self.player
    }

    #[must_use]
    pub fn health(&self) -> u8 {
        self.player.health()
    }

    /// Live zombies in spawn order.
    #[must_use]
    pub fn zombies(&self) -> &[Zombie] {
        &self.zombies
    }

    /// Live bullets in firing order.
    #[must_use]
    pub fn bullets(&self) -> &[Bullet] {
        &self.bullets
    }

    /// Index of the active phase.
    #[must_use]
    pub fn phase(&self) -> usize {
        self.phase
    }

    /// Game time spent in the active phase.
    #[must_use]
    pub fn phase_clock(&self) -> Duration {
        self.phase_clock
    }

    /// Game time since the last spawn (or since the phase started).
    #[must_use]
    pub fn spawn_clock(&self) -> Duration {
        self.spawn_clock
    }

    /// Game time since the episode started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Number of zombies killed by bullets.
    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }
}
