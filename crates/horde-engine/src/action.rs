use serde::{Deserialize, Serialize};

use crate::geometry::Vec2;

/// Raw integer form of an [`Action`], as produced by table lookups or input layers.
pub type ActionId = usize;

/// One of the four cardinal directions used for movement and aiming.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Self; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    /// Unit vector in screen space (`y` grows downward).
    #[must_use]
    pub const fn unit(self) -> Vec2 {
        match self {
            Self::Up => Vec2::new(0.0, -1.0),
            Self::Down => Vec2::new(0.0, 1.0),
            Self::Left => Vec2::new(-1.0, 0.0),
            Self::Right => Vec2::new(1.0, 0.0),
        }
    }
}

/// The closed set of actions accepted by the simulation, one per tick.
///
/// The discriminants are the action ids used as action-value table columns.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    #[default]
    Stay = 0,
    MoveUp = 1,
    MoveDown = 2,
    MoveLeft = 3,
    MoveRight = 4,
    ShootUp = 5,
    ShootDown = 6,
    ShootLeft = 7,
    ShootRight = 8,
}

impl Action {
    pub const LEN: usize = 9;

    pub const ALL: [Self; Self::LEN] = [
        Self::Stay,
        Self::MoveUp,
        Self::MoveDown,
        Self::MoveLeft,
        Self::MoveRight,
        Self::ShootUp,
        Self::ShootDown,
        Self::ShootLeft,
        Self::ShootRight,
    ];

    #[must_use]
    pub const fn id(self) -> ActionId {
        self as ActionId
    }

    /// Converts a raw id, rejecting anything outside `0..Action::LEN`.
    pub fn from_id(id: ActionId) -> Result<Self, InvalidActionError> {
        Self::ALL.get(id).copied().ok_or(InvalidActionError { id })
    }

    #[must_use]
    pub const fn movement(self) -> Option<Direction> {
        match self {
            Self::MoveUp => Some(Direction::Up),
            Self::MoveDown => Some(Direction::Down),
            Self::MoveLeft => Some(Direction::Left),
            Self::MoveRight => Some(Direction::Right),
            _ => None,
        }
    }

    #[must_use]
    pub const fn shot(self) -> Option<Direction> {
        match self {
            Self::ShootUp => Some(Direction::Up),
            Self::ShootDown => Some(Direction::Down),
            Self::ShootLeft => Some(Direction::Left),
            Self::ShootRight => Some(Direction::Right),
            _ => None,
        }
    }

    /// Short human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Stay => "stay",
            Self::MoveUp => "up",
            Self::MoveDown => "down",
            Self::MoveLeft => "left",
            Self::MoveRight => "right",
            Self::ShootUp => "shoot-up",
            Self::ShootDown => "shoot-down",
            Self::ShootLeft => "shoot-left",
            Self::ShootRight => "shoot-right",
        }
    }
}

impl TryFrom<ActionId> for Action {
    type Error = InvalidActionError;

    fn try_from(id: ActionId) -> Result<Self, Self::Error> {
        Self::from_id(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("invalid action id {id} (expected 0..{})", Action::LEN)]
pub struct InvalidActionError {
    pub id: ActionId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_match_table_columns() {
        for (i, action) in Action::ALL.iter().enumerate() {
            assert_eq!(action.id(), i);
            assert_eq!(Action::from_id(i), Ok(*action));
        }
    }

    #[test]
    fn test_out_of_range_id_is_rejected() {
        assert_eq!(Action::from_id(9), Err(InvalidActionError { id: 9 }));
        assert_eq!(
            Action::try_from(usize::MAX),
            Err(InvalidActionError { id: usize::MAX })
        );
    }

    #[test]
    fn test_movement_and_shot_are_exclusive() {
        for action in Action::ALL {
            assert!(!(action.movement().is_some() && action.shot().is_some()));
        }
        assert_eq!(Action::Stay.movement(), None);
        assert_eq!(Action::Stay.shot(), None);
        assert_eq!(Action::ShootLeft.shot(), Some(Direction::Left));
    }
}
