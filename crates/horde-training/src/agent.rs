//! Epsilon-greedy tabular Q-learning agent.
//!
//! # Update Rule
//!
//! After every step the agent moves the value of the action it took toward the
//! one-step temporal-difference target:
//!
//! ```text
//! target = reward + γ · (1 − terminal) · max_a Q[next][a]
//! Q[state][action] ← Q[state][action] + α · (target − Q[state][action])
//! ```
//!
//! A terminal transition never bootstraps: the environment has already reset
//! when it reports `done`, so `next` belongs to a different episode.
//!
//! # Exploration
//!
//! [`QAgent::choose_action`] picks a uniformly random action with probability
//! equal to the exploration rate, and the best-valued action otherwise.
//! [`QAgent::decay_exploration`] is called once per episode and multiplies the
//! rate by a constant factor, flooring it at a minimum.

use horde_engine::Action;
use horde_env::{DiscreteState, StateShape};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::q_table::QTable;

/// Learning hyper-parameters, fixed for a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentParams {
    /// Step size α.
    pub learning_rate: f64,
    /// Discount factor γ.
    pub discount: f64,
    /// Exploration rate of a fresh agent.
    pub initial_exploration: f64,
    /// Per-episode multiplier applied by [`QAgent::decay_exploration`].
    pub exploration_decay: f64,
    /// Floor of the exploration rate.
    pub min_exploration: f64,
}

impl Default for AgentParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            discount: 0.99,
            initial_exploration: 1.0,
            exploration_decay: 0.995,
            min_exploration: 0.01,
        }
    }
}

impl AgentParams {
    /// Checks that every parameter lies in its meaningful range.
    ///
    /// A decay factor above one would make the exploration rate grow.
    pub fn validate(&self) -> Result<(), AgentParamsError> {
        let checks = [
            ("learning_rate", self.learning_rate, false),
            ("discount", self.discount, true),
            ("initial_exploration", self.initial_exploration, true),
            ("min_exploration", self.min_exploration, true),
            ("exploration_decay", self.exploration_decay, false),
        ];
        for (field, value, zero_allowed) in checks {
            let lower_ok = if zero_allowed { value >= 0.0 } else { value > 0.0 };
            if !(value.is_finite() && lower_ok && value <= 1.0) {
                return Err(AgentParamsError { field, value });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, derive_more::Display, derive_more::Error)]
#[display("agent parameter `{field}` is out of range ({value})")]
pub struct AgentParamsError {
    pub field: &'static str,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QAgent {
    params: AgentParams,
    table: QTable,
    exploration_rate: f64,
}

impl QAgent {
    /// Fresh agent: zero table, initial exploration rate.
    #[must_use]
    pub fn new(shape: StateShape, params: AgentParams) -> Self {
        Self {
            table: QTable::new(shape),
            exploration_rate: params.initial_exploration,
            params,
        }
    }

    /// Agent resuming from a saved table and exploration rate.
    #[must_use]
    pub fn from_parts(table: QTable, exploration_rate: f64, params: AgentParams) -> Self {
        Self {
            params,
            table,
            exploration_rate,
        }
    }

    #[must_use]
    pub fn params(&self) -> &AgentParams {
        &self.params
    }

    #[must_use]
    pub fn table(&self) -> &QTable {
        &self.table
    }

    #[must_use]
    pub fn exploration_rate(&self) -> f64 {
        self.exploration_rate
    }

    /// Epsilon-greedy action.
    pub fn choose_action<R>(&self, state: &DiscreteState, rng: &mut R) -> Action
    where
        R: Rng + ?Sized,
    {
        if rng.random::<f64>() < self.exploration_rate {
            Action::ALL[rng.random_range(0..Action::LEN)]
        } else {
            self.greedy_action(state)
        }
    }

    /// Best-valued action, ties to the lowest action id. Never random.
    #[must_use]
    pub fn greedy_action(&self, state: &DiscreteState) -> Action {
        self.table.best_action(state)
    }

    /// Applies one temporal-difference update and returns the new value.
    ///
    /// # Panics
    ///
    /// Panics if the update produces a non-finite value.
    pub fn update(
        &mut self,
        state: &DiscreteState,
        action: Action,
        reward: f64,
        next_state: &DiscreteState,
        terminal: bool,
    ) -> f64 {
        let AgentParams {
            learning_rate,
            discount,
            ..
        } = self.params;
        let current = self.table.value(state, action);
        let bootstrap = if terminal {
            0.0
        } else {
            discount * self.table.max_value(next_state)
        };
        let target = reward + bootstrap;
        let updated = current + learning_rate * (target - current);
        self.table.set(state, action, updated);
        updated
    }

    /// Multiplies the exploration rate by the decay factor, floored at the
    /// minimum. A rate already at or below the floor is left unchanged.
    pub fn decay_exploration(&mut self) {
        if self.exploration_rate > self.params.min_exploration {
            self.exploration_rate = (self.exploration_rate * self.params.exploration_decay)
                .max(self.params.min_exploration);
        }
    }
}

#[cfg(test)]
mod tests {
    use horde_engine::WorldConfig;
    use horde_env::{PositionBucket, ZombieBearing};
    use proptest::prelude::*;
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    const EPS: f64 = 1e-12;

    fn agent(params: AgentParams) -> QAgent {
        QAgent::new(StateShape::for_world(&WorldConfig::default()), params)
    }

    fn state(bearing: ZombieBearing) -> DiscreteState {
        DiscreteState {
            position: PositionBucket::Clear,
            health: 3,
            phase: 0,
            bearing,
        }
    }

    #[test]
    fn test_default_params_are_valid() {
        assert_eq!(AgentParams::default().validate(), Ok(()));
        let edges = AgentParams {
            learning_rate: 1.0,
            discount: 0.0,
            initial_exploration: 0.0,
            exploration_decay: 1.0,
            min_exploration: 0.0,
        };
        assert_eq!(edges.validate(), Ok(()));
    }

    #[test]
    fn test_growing_decay_is_rejected() {
        let params = AgentParams {
            initial_exploration: 0.5,
            exploration_decay: 1.5,
            ..AgentParams::default()
        };
        let err = params.validate().unwrap_err();
        assert_eq!(err.field, "exploration_decay");
    }

    #[test]
    fn test_out_of_range_params_are_rejected() {
        let default = AgentParams::default();
        let cases = [
            AgentParams {
                learning_rate: -3.0,
                ..default
            },
            AgentParams {
                learning_rate: 0.0,
                ..default
            },
            AgentParams {
                discount: 1.01,
                ..default
            },
            AgentParams {
                initial_exploration: 7.0,
                ..default
            },
            AgentParams {
                min_exploration: f64::NAN,
                ..default
            },
            AgentParams {
                exploration_decay: 0.0,
                ..default
            },
        ];
        let fields: Vec<_> = cases
            .iter()
            .map(|params| params.validate().unwrap_err().field)
            .collect();
        assert_eq!(
            fields,
            [
                "learning_rate",
                "learning_rate",
                "discount",
                "initial_exploration",
                "min_exploration",
                "exploration_decay",
            ]
        );
    }

    #[test]
    fn test_update_bootstraps_from_next_state() {
        let mut agent = agent(AgentParams::default());
        let s = state(ZombieBearing::Up);
        let next = state(ZombieBearing::Down);
        agent.table.set(&s, Action::ShootUp, 2.0);
        agent.table.set(&next, Action::MoveLeft, 4.0);
        agent.table.set(&next, Action::Stay, -1.0);

        let updated = agent.update(&s, Action::ShootUp, 1.0, &next, false);

        // 2 + 0.1 * (1 + 0.99 * 4 - 2)
        let expected = 2.0 + 0.1 * (1.0 + 0.99 * 4.0 - 2.0);
        assert!((updated - expected).abs() < EPS);
        assert!((agent.table().value(&s, Action::ShootUp) - expected).abs() < EPS);
    }

    #[test]
    fn test_terminal_update_ignores_next_state() {
        let mut agent = agent(AgentParams::default());
        let s = state(ZombieBearing::Left);
        let next = state(ZombieBearing::None);
        agent.table.set(&s, Action::MoveUp, 3.0);
        agent.table.set(&next, Action::Stay, 100.0);

        let updated = agent.update(&s, Action::MoveUp, -70.0, &next, true);

        let expected = 3.0 + 0.1 * (-70.0 - 3.0);
        assert!((updated - expected).abs() < EPS);
    }

    #[test]
    fn test_full_learning_rate_jumps_to_target() {
        let mut agent = agent(AgentParams {
            learning_rate: 1.0,
            ..AgentParams::default()
        });
        let s = state(ZombieBearing::Right);
        assert!((agent.update(&s, Action::ShootRight, 9.9, &s, true) - 9.9).abs() < EPS);
    }

    #[test]
    fn test_greedy_when_exploration_is_zero() {
        let mut agent = agent(AgentParams {
            initial_exploration: 0.0,
            ..AgentParams::default()
        });
        let s = state(ZombieBearing::UpRight);
        agent.table.set(&s, Action::ShootRight, 0.5);
        let mut rng = Pcg32::seed_from_u64(1);
        for _ in 0..100 {
            assert_eq!(agent.choose_action(&s, &mut rng), Action::ShootRight);
        }
    }

    #[test]
    fn test_full_exploration_covers_every_action() {
        let agent = agent(AgentParams::default());
        let s = state(ZombieBearing::None);
        let mut rng = Pcg32::seed_from_u64(7);
        let mut seen = [false; Action::LEN];
        for _ in 0..1000 {
            seen[agent.choose_action(&s, &mut rng).id()] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn test_decay_reaches_floor_exactly() {
        let mut agent = agent(AgentParams {
            initial_exploration: 0.02,
            exploration_decay: 0.5,
            min_exploration: 0.01,
            ..AgentParams::default()
        });
        agent.decay_exploration();
        assert!((agent.exploration_rate() - 0.01).abs() < EPS);
        agent.decay_exploration();
        assert!((agent.exploration_rate() - 0.01).abs() < EPS);
    }

    #[test]
    fn test_rate_below_floor_is_kept() {
        let table = QTable::new(StateShape::for_world(&WorldConfig::default()));
        let mut agent = QAgent::from_parts(table, 0.001, AgentParams::default());
        agent.decay_exploration();
        assert!((agent.exploration_rate() - 0.001).abs() < EPS);
    }

    proptest! {
        #[test]
        fn prop_exploration_is_non_increasing_and_floored(
            initial in 0.0..=1.0f64,
            decay in 0.5..1.0f64,
            floor in 0.0..0.5f64,
            calls in 1usize..500,
        ) {
            let mut agent = agent(AgentParams {
                initial_exploration: initial,
                exploration_decay: decay,
                min_exploration: floor,
                ..AgentParams::default()
            });
            let lower = initial.min(floor);
            let mut previous = agent.exploration_rate();
            for _ in 0..calls {
                agent.decay_exploration();
                let rate = agent.exploration_rate();
                prop_assert!(rate <= previous);
                prop_assert!(rate >= lower);
                previous = rate;
            }
        }
    }
}
