use std::time::Duration;

use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg32;

use crate::{
    action::{Action, Direction},
    config::{ConfigError, PhaseConfig, WorldConfig},
    entity::{Bullet, Zombie},
    episode::EpisodeState,
    geometry::Vec2,
};

/// What happened during one tick.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TickOutcome {
    /// Sum of every reward contribution applied during the tick.
    pub reward: f64,
    /// True for exactly the tick that ended the episode. The world has already
    /// been reset when this is set.
    pub terminal: bool,
    /// Zombies destroyed by bullets.
    pub kills: u32,
    /// Zombies that reached the player.
    pub hits: u32,
    pub spawned: bool,
    pub phase_advanced: bool,
}

/// Deterministic world advance, one action per fixed-duration tick.
///
/// The only randomness is the spawn position of zombies, drawn from a
/// [`Pcg32`] owned by the simulation. Two simulations built with the same
/// configuration and seed produce identical outcomes for identical action
/// sequences.
///
/// # Example
///
/// ```
/// use horde_engine::{Action, Simulation, WorldConfig};
///
/// let mut sim = Simulation::with_seed(WorldConfig::default(), 7).unwrap();
/// let outcome = sim.advance(Action::ShootUp);
///
/// assert!(!outcome.terminal);
/// assert_eq!(sim.state().bullets().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Simulation {
    config: WorldConfig,
    tick: Duration,
    rng: Pcg32,
    state: EpisodeState,
}

#[derive(Debug, Clone, Copy)]
enum Edge {
    Top,
    Bottom,
    Left,
    Right,
}

impl Simulation {
    /// Creates a simulation seeded from the OS random source.
    pub fn new(config: WorldConfig) -> Result<Self, ConfigError> {
        Self::with_seed(config, rand::rng().random())
    }

    /// Like [`Self::new`], but with a fixed seed for reproducible runs.
    pub fn with_seed(config: WorldConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        let state = EpisodeState::new(&config);
        Ok(Self {
            tick: config.tick_duration(),
            rng: Pcg32::seed_from_u64(seed),
            config,
            state,
        })
    }

    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> &EpisodeState {
        &self.state
    }

    #[must_use]
    pub fn current_phase(&self) -> &PhaseConfig {
        &self.config.phases[self.state.phase]
    }

    /// Replaces the world with a fresh episode. The spawn RNG is not reseeded.
    pub fn reset(&mut self) -> &EpisodeState {
        self.state = EpisodeState::new(&self.config);
        &self.state
    }

    /// Places a zombie with its top-left corner at `position`.
    ///
    /// Used to set up scenarios; regular play only spawns zombies on the edges.
    pub fn insert_zombie(&mut self, position: Vec2) {
        self.state
            .zombies
            .push(Zombie::new(position, self.config.zombie_size));
    }

    /// Places a bullet centered at `center` travelling in `direction`.
    pub fn insert_bullet(&mut self, center: Vec2, direction: Direction) {
        self.state
            .bullets
            .push(Bullet::new(center, self.config.bullet_size, direction));
    }

    /// Advances the world by one tick.
    ///
    /// On the tick that takes the player's health to zero the world is reset
    /// before returning, so [`Self::state`] already shows the next episode while
    /// the outcome reports `terminal = true`.
    pub fn advance(&mut self, action: Action) -> TickOutcome {
        let rewards = self.config.rewards;

        if self.state.terminal {
            self.reset();
            return TickOutcome {
                reward: rewards.already_terminal,
                terminal: true,
                ..TickOutcome::default()
            };
        }

        let mut outcome = TickOutcome::default();
        self.apply_action(action, &mut outcome);
        self.advance_clocks();
        self.advance_phase(&mut outcome);
        self.spawn_zombie(&mut outcome);
        self.move_zombies();
        self.move_bullets();
        self.resolve_bullet_hits(&mut outcome);
        self.resolve_player_hits(&mut outcome);

        if !outcome.terminal {
            outcome.reward += rewards.survival;
        }
        outcome
    }

    fn apply_action(&mut self, action: Action, outcome: &mut TickOutcome) {
        let config = &self.config;
        let player = &mut self.state.player;

        if let Some(direction) = action.movement() {
            let target = player.position() + direction.unit() * config.player_speed;
            let clamped = Vec2::new(
                target.x.clamp(0.0, config.width - config.player_size),
                target.y.clamp(0.0, config.height - config.player_size),
            );
            player.set_position(clamped);
        } else if let Some(direction) = action.shot() {
            player.set_aim(direction);
            let bullet = Bullet::new(player.center(), config.bullet_size, direction);
            self.state.bullets.push(bullet);
            outcome.reward += config.rewards.shoot;
        }
    }

    fn advance_clocks(&mut self) {
        let state = &mut self.state;
        state.ticks += 1;
        state.elapsed += self.tick;
        state.phase_clock += self.tick;
        state.spawn_clock += self.tick;
    }

    fn advance_phase(&mut self, outcome: &mut TickOutcome) {
        let state = &mut self.state;
        if state.phase + 1 >= self.config.phases.len() {
            return;
        }
        let Some(duration) = self.config.phases[state.phase].duration else {
            return;
        };
        if state.phase_clock > duration {
            state.phase += 1;
            state.phase_clock = Duration::ZERO;
            state.spawn_clock = Duration::ZERO;
            outcome.reward += self.config.rewards.phase_bonus;
            outcome.phase_advanced = true;
        }
    }

    fn spawn_zombie(&mut self, outcome: &mut TickOutcome) {
        let phase = &self.config.phases[self.state.phase];
        if self.state.spawn_clock <= phase.spawn_delay
            || self.state.zombies.len() >= self.config.zombie_cap
        {
            return;
        }

        let size = self.config.zombie_size;
        let max_x = (self.config.width - size).max(0.0);
        let max_y = (self.config.height - size).max(0.0);
        let edge = match self.rng.random_range(0..4) {
            0 => Edge::Top,
            1 => Edge::Bottom,
            2 => Edge::Left,
            _ => Edge::Right,
        };
        let position = match edge {
            Edge::Top => Vec2::new(self.rng.random_range(0.0..=max_x), 0.0),
            Edge::Bottom => Vec2::new(self.rng.random_range(0.0..=max_x), max_y),
            Edge::Left => Vec2::new(0.0, self.rng.random_range(0.0..=max_y)),
            Edge::Right => Vec2::new(max_x, self.rng.random_range(0.0..=max_y)),
        };

        self.state.zombies.push(Zombie::new(position, size));
        self.state.spawn_clock = Duration::ZERO;
        outcome.spawned = true;
    }

    fn move_zombies(&mut self) {
        let speed = self.config.phases[self.state.phase].zombie_speed;
        let target = self.state.player.center();
        let size = self.config.zombie_size;
        let (width, height) = (self.config.width, self.config.height);

        for zombie in &mut self.state.zombies {
            zombie.step_toward(target, speed);
        }
        self.state.zombies.retain(|zombie| {
            let p = zombie.position();
            (-size..=width).contains(&p.x) && (-size..=height).contains(&p.y)
        });
    }

    fn move_bullets(&mut self) {
        let speed = self.config.bullet_speed;
        let (width, height) = (self.config.width, self.config.height);

        for bullet in &mut self.state.bullets {
            bullet.advance(speed);
        }
        self.state.bullets.retain(|bullet| {
            let p = bullet.position();
            (0.0..=width).contains(&p.x) && (0.0..=height).contains(&p.y)
        });
    }

    /// Each bullet removes at most one zombie: the first overlapping one in spawn order.
    fn resolve_bullet_hits(&mut self, outcome: &mut TickOutcome) {
        let state = &mut self.state;
        let mut i = 0;
        while i < state.bullets.len() {
            let bullet = state.bullets[i].rect();
            let hit = state
                .zombies
                .iter()
                .position(|zombie| zombie.rect().overlaps(&bullet));
            if let Some(j) = hit {
                state.zombies.remove(j);
                state.bullets.remove(i);
                state.score += 1;
                outcome.kills += 1;
                outcome.reward += self.config.rewards.kill;
            } else {
                i += 1;
            }
        }
    }

    /// Every zombie touching the player is removed and costs one health point.
    fn resolve_player_hits(&mut self, outcome: &mut TickOutcome) {
        let rewards = self.config.rewards;
        let player = self.state.player.rect();
        let mut i = 0;
        while i < self.state.zombies.len() {
            if !self.state.zombies[i].rect().overlaps(&player) {
                i += 1;
                continue;
            }
            self.state.zombies.remove(i);
            outcome.hits += 1;
            outcome.reward += rewards.damage;
            if self.state.player.take_hit() == 0 {
                self.state.terminal = true;
                outcome.terminal = true;
                outcome.reward += rewards.death;
                self.reset();
                return;
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn force_terminal(&mut self) {
        self.state.terminal = true;
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    const EPS: f64 = 1e-9;

    fn sim() -> Simulation {
        Simulation::with_seed(WorldConfig::default(), 42).unwrap()
    }

    fn assert_fresh(state: &EpisodeState, config: &WorldConfig) {
        assert_eq!(state.health(), config.max_health);
        assert_eq!(state.score(), 0);
        assert_eq!(state.phase(), 0);
        assert_eq!(state.ticks(), 0);
        assert!(state.zombies().is_empty());
        assert!(state.bullets().is_empty());
        assert!(!state.is_terminal());
        assert_eq!(state.player().position(), config.player_start());
    }

    #[test]
    fn test_reset_produces_fresh_episode() {
        let mut sim = sim();
        for _ in 0..200 {
            sim.advance(Action::ShootLeft);
        }
        sim.insert_zombie(Vec2::new(10.0, 10.0));
        let config = sim.config().clone();
        assert_fresh(sim.reset(), &config);
    }

    #[test]
    fn test_single_shot_creates_one_bullet() {
        let mut sim = sim();
        let outcome = sim.advance(Action::ShootRight);

        assert_eq!(sim.state().bullets().len(), 1);
        assert_eq!(outcome.kills, 0);
        assert_eq!(sim.state().score(), 0);
        assert!(sim.state().zombies().is_empty());
        assert_eq!(sim.state().player().aim(), Direction::Right);
        // shoot penalty + survival reward
        assert!((outcome.reward - 0.0).abs() < EPS);
    }

    #[test]
    fn test_bullet_on_zombie_kills_both() {
        let mut sim = sim();
        sim.insert_zombie(Vec2::new(100.0, 100.0));
        sim.insert_bullet(Vec2::new(120.0, 120.0), Direction::Up);

        let outcome = sim.advance(Action::Stay);

        assert!(sim.state().zombies().is_empty());
        assert!(sim.state().bullets().is_empty());
        assert_eq!(sim.state().score(), 1);
        assert_eq!(outcome.kills, 1);
        assert!((outcome.reward - 10.1).abs() < EPS);
    }

    #[test]
    fn test_bullet_kills_at_most_one_zombie() {
        let mut sim = sim();
        sim.insert_zombie(Vec2::new(100.0, 100.0));
        sim.insert_zombie(Vec2::new(101.0, 101.0));
        sim.insert_bullet(Vec2::new(120.0, 120.0), Direction::Up);

        let outcome = sim.advance(Action::Stay);

        assert_eq!(outcome.kills, 1);
        assert_eq!(sim.state().zombies().len(), 1);
        assert_eq!(sim.state().score(), 1);
    }

    #[test]
    fn test_player_hit_costs_one_health() {
        let mut sim = sim();
        let start = sim.config().player_start();
        sim.insert_zombie(start);

        let outcome = sim.advance(Action::Stay);

        assert_eq!(outcome.hits, 1);
        assert!(!outcome.terminal);
        assert_eq!(sim.state().health(), 2);
        assert!(sim.state().zombies().is_empty());
        assert!((outcome.reward - (-20.0 + 0.1)).abs() < EPS);
    }

    #[test]
    fn test_fatal_hit_reports_terminal_and_resets() {
        let config = WorldConfig {
            max_health: 1,
            ..WorldConfig::default()
        };
        let mut sim = Simulation::with_seed(config.clone(), 1).unwrap();
        sim.advance(Action::MoveLeft);
        let at = sim.state().player().position();
        sim.insert_zombie(at);

        let outcome = sim.advance(Action::Stay);

        assert!(outcome.terminal);
        assert_eq!(outcome.hits, 1);
        // damage + death, no survival reward
        assert!((outcome.reward - (-70.0)).abs() < EPS);
        assert_fresh(sim.state(), &config);

        let next = sim.advance(Action::Stay);
        assert!(!next.terminal);
        assert_eq!(sim.state().health(), 1);
    }

    #[test]
    fn test_already_terminal_resets_with_penalty() {
        let mut sim = sim();
        sim.advance(Action::MoveLeft);
        sim.force_terminal();

        let outcome = sim.advance(Action::ShootUp);

        assert!(outcome.terminal);
        assert!((outcome.reward - (-50.0)).abs() < EPS);
        let config = sim.config().clone();
        assert_fresh(sim.state(), &config);
    }

    #[test]
    fn test_movement_is_blocked_at_edges() {
        let config = WorldConfig {
            zombie_cap: 0,
            ..WorldConfig::default()
        };
        let mut sim = Simulation::with_seed(config, 0).unwrap();
        for _ in 0..200 {
            sim.advance(Action::MoveLeft);
        }
        for _ in 0..200 {
            sim.advance(Action::MoveUp);
        }
        assert_eq!(sim.state().player().position(), Vec2::ZERO);

        for _ in 0..400 {
            sim.advance(Action::MoveRight);
        }
        let config = sim.config();
        assert_eq!(
            sim.state().player().rect().right(),
            config.width,
            "player must stop at the right edge"
        );
    }

    #[test]
    fn test_one_spawn_per_eligible_tick_until_cap() {
        let mut config = WorldConfig::default();
        config.zombie_cap = 5;
        for phase in &mut config.phases {
            phase.spawn_delay = Duration::ZERO;
            phase.zombie_speed = 0.0;
        }
        let mut sim = Simulation::with_seed(config, 3).unwrap();

        for tick in 1..=10 {
            let before = sim.state().zombies().len();
            let outcome = sim.advance(Action::Stay);
            let after = sim.state().zombies().len();
            if tick <= 5 {
                assert!(outcome.spawned);
                assert_eq!(after, before + 1);
            } else {
                assert!(!outcome.spawned);
                assert_eq!(after, 5);
            }
        }
    }

    #[test]
    fn test_first_spawn_waits_for_delay() {
        let mut sim = sim();
        // 1500 ms at 60 ticks/s: the clock first exceeds the delay on tick 91
        for _ in 0..90 {
            assert!(!sim.advance(Action::Stay).spawned);
        }
        assert!(sim.advance(Action::Stay).spawned);
        assert_eq!(sim.state().zombies().len(), 1);
        assert_eq!(sim.state().spawn_clock(), Duration::ZERO);
    }

    #[test]
    fn test_phase_advances_after_duration_with_bonus() {
        let mut config = WorldConfig {
            tick_rate: 10,
            ..WorldConfig::default()
        };
        config.phases[0].duration = Some(Duration::from_millis(250));
        config.phases[1].duration = Some(Duration::from_millis(100));
        let mut sim = Simulation::with_seed(config, 5).unwrap();

        assert!(!sim.advance(Action::Stay).phase_advanced);
        assert!(!sim.advance(Action::Stay).phase_advanced);
        let outcome = sim.advance(Action::Stay);
        assert!(outcome.phase_advanced);
        assert!((outcome.reward - 5.1).abs() < EPS);
        assert_eq!(sim.state().phase(), 1);
        assert_eq!(sim.state().phase_clock(), Duration::ZERO);

        sim.advance(Action::Stay);
        assert!(sim.advance(Action::Stay).phase_advanced);
        assert_eq!(sim.state().phase(), 2);

        // last phase never ends
        for _ in 0..20 {
            assert!(!sim.advance(Action::Stay).phase_advanced);
        }
        assert_eq!(sim.state().phase(), 2);
        assert_eq!(sim.current_phase().name, "Phase 3");
    }

    #[test]
    fn test_zombies_leaving_inflated_bounds_are_removed() {
        let mut sim = sim();
        sim.insert_zombie(Vec2::new(-50.0, 100.0));
        sim.insert_zombie(Vec2::new(-30.0, 100.0));
        sim.advance(Action::Stay);
        assert_eq!(sim.state().zombies().len(), 1);
    }

    #[test]
    fn test_bullets_leaving_world_are_removed() {
        let mut sim = sim();
        sim.insert_bullet(Vec2::new(400.0, 3.0), Direction::Up);
        sim.advance(Action::Stay);
        assert!(sim.state().bullets().is_empty());
    }

    #[test]
    fn test_same_seed_replays_identically() {
        let actions: Vec<Action> = (0..3000).map(|i| Action::ALL[(i * 7 + i / 13) % 9]).collect();
        let mut a = Simulation::with_seed(WorldConfig::default(), 99).unwrap();
        let mut b = Simulation::with_seed(WorldConfig::default(), 99).unwrap();
        for &action in &actions {
            assert_eq!(a.advance(action), b.advance(action));
            assert_eq!(a.state(), b.state());
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_health_only_drops_by_hits(
            seed in any::<u64>(),
            actions in proptest::collection::vec(0..Action::LEN, 1500),
        ) {
            let mut sim = Simulation::with_seed(WorldConfig::default(), seed).unwrap();
            let max = sim.config().max_health;
            for id in actions {
                let before = sim.state().health();
                let outcome = sim.advance(Action::ALL[id]);
                let after = sim.state().health();
                prop_assert!(after <= max);
                if outcome.terminal {
                    prop_assert_eq!(after, max);
                    prop_assert_eq!(u32::from(before), outcome.hits);
                } else {
                    prop_assert_eq!(u32::from(before - after), outcome.hits);
                }
            }
        }
    }
}
