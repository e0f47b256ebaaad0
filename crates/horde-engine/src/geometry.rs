//! Continuous world geometry.
//!
//! All positions are real-valued world units with the origin at the top-left
//! corner and `y` growing downward. Collision and bounds tests operate on
//! axis-aligned rectangles, never on point distances.

use std::ops::{Add, AddAssign, Mul, Sub};

use serde::{Deserialize, Serialize};

/// A 2D vector in world units.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self::new(0.0, 0.0);

    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean norm.
    #[must_use]
    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Returns the unit vector pointing the same way, or `None` for the zero vector.
    #[must_use]
    pub fn normalized(self) -> Option<Self> {
        let length = self.length();
        (length > 0.0).then(|| Self::new(self.x / length, self.y / length))
    }
}

impl Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

/// Width and height of a rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub const fn square(side: f32) -> Self {
        Self::new(side, side)
    }
}

/// Axis-aligned rectangle anchored at its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Size,
}

impl Rect {
    #[must_use]
    pub const fn new(origin: Vec2, size: Size) -> Self {
        Self { origin, size }
    }

    /// Creates a rectangle of `size` whose center is `center`.
    #[must_use]
    pub fn centered_at(center: Vec2, size: Size) -> Self {
        Self::new(
            Vec2::new(center.x - size.width / 2.0, center.y - size.height / 2.0),
            size,
        )
    }

    #[must_use]
    pub fn left(&self) -> f32 {
        self.origin.x
    }

    #[must_use]
    pub fn top(&self) -> f32 {
        self.origin.y
    }

    #[must_use]
    pub fn right(&self) -> f32 {
        self.origin.x + self.size.width
    }

    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.origin.y + self.size.height
    }

    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(
            self.origin.x + self.size.width / 2.0,
            self.origin.y + self.size.height / 2.0,
        )
    }

    /// Strict overlap test: rectangles that only share an edge do not overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }
}
