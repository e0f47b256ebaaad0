//! Top-down zombie survival simulation.
//!
//! The engine advances a continuous 2D arena one fixed-duration tick at a time:
//!
//! - [`Simulation`] - owns the [`EpisodeState`] and applies all game rules
//! - [`EpisodeState`] - world snapshot (player, zombies, bullets, phase, score)
//! - [`Action`] - the closed set of per-tick inputs (stay, move, shoot)
//! - [`WorldConfig`] - arena geometry, difficulty phases and reward magnitudes
//!
//! # Tick Order
//!
//! 1. Apply the action (move the player or fire a bullet)
//! 2. Advance the episode, phase and spawn clocks by one tick
//! 3. Advance to the next phase when the current one has run its course
//! 4. Spawn at most one zombie on a random edge
//! 5. Move zombies toward the player, drop those that wandered off
//! 6. Move bullets, drop those that left the arena
//! 7. Resolve bullet/zombie hits, then zombie/player hits
//!
//! Ticks are not tied to wall-clock time. A renderer can pace them at
//! [`WorldConfig::tick_rate`], a trainer can run them as fast as possible.

pub use self::{
    action::{Action, ActionId, Direction, InvalidActionError},
    config::{ConfigError, PhaseConfig, RewardConfig, WorldConfig},
    entity::{Bullet, Player, Zombie},
    episode::EpisodeState,
    geometry::{Rect, Size, Vec2},
    simulation::{Simulation, TickOutcome},
};

pub mod action;
pub mod config;
pub mod entity;
pub mod episode;
pub mod geometry;
pub mod simulation;
