//! Plain entity data. All rules that mutate entities live in [`crate::simulation`].

use crate::{
    action::Direction,
    geometry::{Rect, Size, Vec2},
};

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    rect: Rect,
    health: u8,
    aim: Direction,
}

impl Player {
    #[must_use]
    pub fn new(position: Vec2, size: f32, health: u8) -> Self {
        Self {
            rect: Rect::new(position, Size::square(size)),
            health,
            aim: Direction::Up,
        }
    }

    #[must_use]
    pub fn rect(&self) -> Rect {
        self.rect
    }

    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.rect.origin
    }

    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.rect.center()
    }

    #[must_use]
    pub fn health(&self) -> u8 {
        self.health
    }

    #[must_use]
    pub fn aim(&self) -> Direction {
        self.aim
    }

    pub(crate) fn set_position(&mut self, position: Vec2) {
        self.rect.origin = position;
    }

    pub(crate) fn set_aim(&mut self, aim: Direction) {
        self.aim = aim;
    }

    /// Removes one point of health, saturating at zero. Returns the remaining health.
    pub(crate) fn take_hit(&mut self) -> u8 {
        self.health = self.health.saturating_sub(1);
        self.health
    }
}

/// A zombie. Its speed is not stored: it comes from the active phase.
#[derive(Debug, Clone, PartialEq)]
pub struct Zombie {
    rect: Rect,
}

impl Zombie {
    #[must_use]
    pub fn new(position: Vec2, size: f32) -> Self {
        Self {
            rect: Rect::new(position, Size::square(size)),
        }
    }

    #[must_use]
    pub fn rect(&self) -> Rect {
        self.rect
    }

    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.rect.origin
    }

    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.rect.center()
    }

    /// Moves `speed` units toward `target`. A zero-length offset leaves the zombie in place.
    pub(crate) fn step_toward(&mut self, target: Vec2, speed: f32) {
        if let Some(heading) = (target - self.center()).normalized() {
            self.rect.origin += heading * speed;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bullet {
    rect: Rect,
    direction: Direction,
}

impl Bullet {
    #[must_use]
    pub fn new(center: Vec2, size: Size, direction: Direction) -> Self {
        Self {
            rect: Rect::centered_at(center, size),
            direction,
        }
    }

    #[must_use]
    pub fn rect(&self) -> Rect {
        self.rect
    }

    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.rect.origin
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub(crate) fn advance(&mut self, speed: f32) {
        self.rect.origin += self.direction.unit() * speed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zombie_steps_toward_target_by_speed() {
        let mut zombie = Zombie::new(Vec2::new(0.0, 0.0), 40.0);
        // center (20, 20) -> target (50, 60): offset (30, 40), length 50
        zombie.step_toward(Vec2::new(50.0, 60.0), 5.0);
        let position = zombie.position();
        assert!((position.x - 3.0).abs() < 1e-5);
        assert!((position.y - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_zombie_on_target_does_not_move() {
        let mut zombie = Zombie::new(Vec2::new(10.0, 10.0), 40.0);
        zombie.step_toward(Vec2::new(30.0, 30.0), 4.0);
        assert_eq!(zombie.position(), Vec2::new(10.0, 10.0));
    }

    #[test]
    fn test_player_health_saturates() {
        let mut player = Player::new(Vec2::ZERO, 40.0, 1);
        assert_eq!(player.take_hit(), 0);
        assert_eq!(player.take_hit(), 0);
    }

    #[test]
    fn test_bullet_moves_along_direction() {
        let mut bullet = Bullet::new(Vec2::new(100.0, 100.0), Size::new(5.0, 10.0), Direction::Left);
        bullet.advance(7.0);
        assert_eq!(bullet.rect().center(), Vec2::new(93.0, 100.0));
    }
}
