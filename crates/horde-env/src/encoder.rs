//! Projection of the continuous world onto a small discrete state.
//!
//! A [`DiscreteState`] has four fields, each with a fixed finite range:
//!
//! | Field | Values | Cardinality |
//! |---|---|---|
//! | `position` | [`PositionBucket`]: clear, near top/bottom/left/right | 5 |
//! | `health` | `0..=max_health` | `max_health + 1` |
//! | `phase` | `0..phase_count` | `phase_count` |
//! | `bearing` | [`ZombieBearing`]: none or one of 8 compass sectors | 9 |
//!
//! With the default world this gives `5 * 4 * 3 * 9 = 540` states, small enough
//! for a dense action-value table.
//!
//! # Position buckets
//!
//! The player is "near" a wall when its rectangle comes within the margin
//! (50 units by default) of that wall. When several walls are near at once
//! (corners) the first match in the order top, bottom, left, right wins.
//!
//! # Bearing sectors
//!
//! The nearest zombie (Euclidean distance between rectangle centers, first in
//! spawn order on ties) is located by its angle `atan2(-dy, dx)` in degrees,
//! with `y` flipped so that "up" on screen is a positive angle. Sectors are 45°
//! wide and centered on the compass directions, so their boundaries sit at odd
//! multiples of 22.5°. A boundary angle belongs to the sector on its
//! counter-clockwise side: exactly 22.5° is up-right, exactly -22.5° is right.

use horde_engine::{EpisodeState, Vec2, WorldConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionBucket {
    #[default]
    Clear = 0,
    NearTop = 1,
    NearBottom = 2,
    NearLeft = 3,
    NearRight = 4,
}

impl PositionBucket {
    pub const LEN: usize = 5;

    pub const ALL: [Self; Self::LEN] = [
        Self::Clear,
        Self::NearTop,
        Self::NearBottom,
        Self::NearLeft,
        Self::NearRight,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Clear => "clear",
            Self::NearTop => "near-top",
            Self::NearBottom => "near-bottom",
            Self::NearLeft => "near-left",
            Self::NearRight => "near-right",
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZombieBearing {
    /// No zombie in the arena.
    #[default]
    None = 0,
    Right = 1,
    UpRight = 2,
    Up = 3,
    UpLeft = 4,
    Left = 5,
    DownLeft = 6,
    Down = 7,
    DownRight = 8,
}

impl ZombieBearing {
    pub const LEN: usize = 9;

    pub const ALL: [Self; Self::LEN] = [
        Self::None,
        Self::Right,
        Self::UpRight,
        Self::Up,
        Self::UpLeft,
        Self::Left,
        Self::DownLeft,
        Self::Down,
        Self::DownRight,
    ];

    /// Sectors counter-clockwise from the positive x axis.
    const SECTORS: [Self; 8] = [
        Self::Right,
        Self::UpRight,
        Self::Up,
        Self::UpLeft,
        Self::Left,
        Self::DownLeft,
        Self::Down,
        Self::DownRight,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Right => "right",
            Self::UpRight => "up-right",
            Self::Up => "up",
            Self::UpLeft => "up-left",
            Self::Left => "left",
            Self::DownLeft => "down-left",
            Self::Down => "down",
            Self::DownRight => "down-right",
        }
    }

    /// Bearing of a screen-space offset (`y` grows downward).
    #[must_use]
    pub fn from_offset(offset: Vec2) -> Self {
        Self::from_degrees((-offset.y).atan2(offset.x).to_degrees())
    }

    /// Sector of a counter-clockwise angle from the positive x axis, in `[-180, 180]`.
    fn from_degrees(degrees: f32) -> Self {
        #[expect(clippy::cast_possible_truncation)]
        let sector = ((degrees + 22.5) / 45.0).floor() as i32;
        let sector = usize::try_from(sector.rem_euclid(8)).unwrap_or_default();
        Self::SECTORS[sector]
    }
}

/// Cardinality of each [`DiscreteState`] field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateShape {
    pub position_buckets: usize,
    pub health_levels: usize,
    pub phases: usize,
    pub bearings: usize,
}

impl StateShape {
    #[must_use]
    pub fn for_world(config: &WorldConfig) -> Self {
        Self {
            position_buckets: PositionBucket::LEN,
            health_levels: usize::from(config.max_health) + 1,
            phases: config.phase_count(),
            bearings: ZombieBearing::LEN,
        }
    }

    /// Total number of distinct states.
    #[must_use]
    pub fn cardinality(&self) -> usize {
        self.position_buckets * self.health_levels * self.phases * self.bearings
    }

    #[must_use]
    pub fn contains(&self, state: &DiscreteState) -> bool {
        state.position.index() < self.position_buckets
            && usize::from(state.health) < self.health_levels
            && usize::from(state.phase) < self.phases
            && state.bearing.index() < self.bearings
    }

    /// Iterates over every state of this shape in index order.
    pub fn states(&self) -> impl Iterator<Item = DiscreteState> + '_ {
        (0..self.cardinality()).filter_map(|index| DiscreteState::from_index(index, self))
    }
}

/// Table key derived from an [`EpisodeState`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiscreteState {
    pub position: PositionBucket,
    pub health: u8,
    pub phase: u8,
    pub bearing: ZombieBearing,
}

impl DiscreteState {
    /// Row-major index into a dense table of `shape`.
    ///
    /// # Panics
    ///
    /// Panics if the state lies outside `shape`.
    #[must_use]
    pub fn index(&self, shape: &StateShape) -> usize {
        assert!(
            shape.contains(self),
            "state {self:?} is outside of shape {shape:?}"
        );
        let mut index = self.position.index();
        index = index * shape.health_levels + usize::from(self.health);
        index = index * shape.phases + usize::from(self.phase);
        index * shape.bearings + self.bearing.index()
    }

    /// Inverse of [`Self::index`].
    #[must_use]
    pub fn from_index(index: usize, shape: &StateShape) -> Option<Self> {
        if index >= shape.cardinality() {
            return None;
        }
        let bearing = index % shape.bearings;
        let rest = index / shape.bearings;
        let phase = rest % shape.phases;
        let rest = rest / shape.phases;
        let health = rest % shape.health_levels;
        let position = rest / shape.health_levels;
        Some(Self {
            position: *PositionBucket::ALL.get(position)?,
            health: u8::try_from(health).ok()?,
            phase: u8::try_from(phase).ok()?,
            bearing: *ZombieBearing::ALL.get(bearing)?,
        })
    }
}

/// Pure function from [`EpisodeState`] to [`DiscreteState`].
#[derive(Debug, Clone)]
pub struct StateEncoder {
    margin: f32,
    width: f32,
    height: f32,
    shape: StateShape,
}

impl StateEncoder {
    pub const DEFAULT_MARGIN: f32 = 50.0;

    #[must_use]
    pub fn new(config: &WorldConfig) -> Self {
        Self::with_margin(config, Self::DEFAULT_MARGIN)
    }

    #[must_use]
    pub fn with_margin(config: &WorldConfig, margin: f32) -> Self {
        Self {
            margin,
            width: config.width,
            height: config.height,
            shape: StateShape::for_world(config),
        }
    }

    #[must_use]
    pub fn shape(&self) -> StateShape {
        self.shape
    }

    #[must_use]
    pub fn encode(&self, state: &EpisodeState) -> DiscreteState {
        DiscreteState {
            position: self.position_bucket(state),
            health: state.health(),
            phase: u8::try_from(state.phase()).expect("phase count is validated to fit in u8"),
            bearing: nearest_zombie_bearing(state),
        }
    }

    fn position_bucket(&self, state: &EpisodeState) -> PositionBucket {
        let rect = state.player().rect();
        if rect.top() < self.margin {
            PositionBucket::NearTop
        } else if rect.bottom() > self.height - self.margin {
            PositionBucket::NearBottom
        } else if rect.left() < self.margin {
            PositionBucket::NearLeft
        } else if rect.right() > self.width - self.margin {
            PositionBucket::NearRight
        } else {
            PositionBucket::Clear
        }
    }
}

fn nearest_zombie_bearing(state: &EpisodeState) -> ZombieBearing {
    let center = state.player().center();
    state
        .zombies()
        .iter()
        .map(|zombie| zombie.center() - center)
        .min_by(|a, b| a.length().total_cmp(&b.length()))
        .map_or(ZombieBearing::None, ZombieBearing::from_offset)
}
