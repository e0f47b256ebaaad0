use horde_engine::{
    Action, ActionId, ConfigError, EpisodeState, InvalidActionError, Simulation, TickOutcome,
    WorldConfig,
};

use crate::encoder::{DiscreteState, StateEncoder, StateShape};

/// Result of one [`Environment::step`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub state: DiscreteState,
    pub reward: f64,
    pub done: bool,
    /// Zombies killed during the step.
    pub kills: u32,
}

/// The two-call contract reinforcement-learning callers drive.
pub trait Environment {
    /// Shape of every state this environment can return.
    fn shape(&self) -> StateShape;

    fn reset(&mut self) -> DiscreteState;

    fn step(&mut self, action: Action) -> Step;

    /// Steps with a raw action id. An unknown id is rejected before anything
    /// in the world changes.
    fn step_id(&mut self, id: ActionId) -> Result<Step, InvalidActionError> {
        let action = Action::from_id(id)?;
        Ok(self.step(action))
    }
}

/// [`Simulation`] plus [`StateEncoder`], exposing only discrete states.
///
/// The underlying world stays reachable through [`ShooterEnv::episode`] so a
/// renderer can draw the same episode the agent is playing.
#[derive(Debug, Clone)]
pub struct ShooterEnv {
    sim: Simulation,
    encoder: StateEncoder,
    last_outcome: TickOutcome,
}

impl ShooterEnv {
    pub fn new(config: WorldConfig) -> Result<Self, ConfigError> {
        Ok(Self::from_simulation(Simulation::new(config)?))
    }

    pub fn with_seed(config: WorldConfig, seed: u64) -> Result<Self, ConfigError> {
        Ok(Self::from_simulation(Simulation::with_seed(config, seed)?))
    }

    #[must_use]
    pub fn from_simulation(sim: Simulation) -> Self {
        let encoder = StateEncoder::new(sim.config());
        Self {
            sim,
            encoder,
            last_outcome: TickOutcome::default(),
        }
    }

    #[must_use]
    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    #[must_use]
    pub fn episode(&self) -> &EpisodeState {
        self.sim.state()
    }

    /// Details of the most recent tick.
    #[must_use]
    pub fn last_outcome(&self) -> &TickOutcome {
        &self.last_outcome
    }

    #[must_use]
    pub fn observe(&self) -> DiscreteState {
        self.encoder.encode(self.sim.state())
    }
}

impl Environment for ShooterEnv {
    fn shape(&self) -> StateShape {
        self.encoder.shape()
    }

    fn reset(&mut self) -> DiscreteState {
        self.last_outcome = TickOutcome::default();
        self.encoder.encode(self.sim.reset())
    }

    fn step(&mut self, action: Action) -> Step {
        self.last_outcome = self.sim.advance(action);
        Step {
            state: self.encoder.encode(self.sim.state()),
            reward: self.last_outcome.reward,
            done: self.last_outcome.terminal,
            kills: self.last_outcome.kills,
        }
    }
}
