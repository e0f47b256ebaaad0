//! Reinforcement-learning view of the horde simulation.
//!
//! [`ShooterEnv`] wraps a [`horde_engine::Simulation`] and a [`StateEncoder`]
//! behind the [`Environment`] trait: `reset` returns a [`DiscreteState`], `step`
//! takes an [`horde_engine::Action`] and returns the next state, the tick's
//! reward and whether the episode ended.

pub use self::{
    encoder::{DiscreteState, PositionBucket, StateEncoder, StateShape, ZombieBearing},
    environment::{Environment, ShooterEnv, Step},
};

pub mod encoder;
pub mod environment;
