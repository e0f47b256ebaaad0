//! Dense action-value table.
//!
//! The canonical encoding has a small, fixed number of states, so every row is
//! allocated up front and indexed by [`DiscreteState::index`]. A fresh row is
//! all zeros, which is also the value of a state that has never been visited.

use horde_engine::Action;
use horde_env::{DiscreteState, StateShape};

/// One value per action, indexed by [`Action::id`].
pub type ActionValues = [f64; Action::LEN];

#[derive(Debug, Clone, PartialEq)]
pub struct QTable {
    shape: StateShape,
    rows: Vec<ActionValues>,
}

impl QTable {
    /// All-zero table covering every state of `shape`.
    #[must_use]
    pub fn new(shape: StateShape) -> Self {
        Self {
            shape,
            rows: vec![[0.0; Action::LEN]; shape.cardinality()],
        }
    }

    /// Builds a table from existing rows.
    ///
    /// Returns `None` when the row count does not match `shape`.
    #[must_use]
    pub fn from_rows(shape: StateShape, rows: Vec<ActionValues>) -> Option<Self> {
        (rows.len() == shape.cardinality()).then_some(Self { shape, rows })
    }

    #[must_use]
    pub fn shape(&self) -> &StateShape {
        &self.shape
    }

    #[must_use]
    pub fn rows(&self) -> &[ActionValues] {
        &self.rows
    }

    #[must_use]
    pub fn values(&self, state: &DiscreteState) -> &ActionValues {
        &self.rows[state.index(&self.shape)]
    }

    #[must_use]
    pub fn value(&self, state: &DiscreteState, action: Action) -> f64 {
        self.values(state)[action.id()]
    }

    /// # Panics
    ///
    /// Panics if `value` is not finite.
    pub fn set(&mut self, state: &DiscreteState, action: Action, value: f64) {
        assert!(
            value.is_finite(),
            "non-finite value {value} for {state:?}/{action:?}"
        );
        let index = state.index(&self.shape);
        self.rows[index][action.id()] = value;
    }

    /// Highest-valued action. Ties go to the lowest action id.
    #[must_use]
    pub fn best_action(&self, state: &DiscreteState) -> Action {
        let values = self.values(state);
        let mut best = 0;
        for (id, value) in values.iter().enumerate().skip(1) {
            if *value > values[best] {
                best = id;
            }
        }
        Action::ALL[best]
    }

    #[must_use]
    pub fn max_value(&self, state: &DiscreteState) -> f64 {
        self.values(state)
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// States whose row holds at least one non-zero value.
    pub fn visited(&self) -> impl Iterator<Item = (DiscreteState, &ActionValues)> + '_ {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.iter().any(|v| *v != 0.0))
            .filter_map(|(index, row)| {
                DiscreteState::from_index(index, &self.shape).map(|state| (state, row))
            })
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.rows.iter().flatten().all(|v| v.is_finite())
    }
}
