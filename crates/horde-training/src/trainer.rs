//! Episode loop tying an [`Environment`] to a [`QAgent`].
//!
//! # Episode
//!
//! 1. `reset` the environment
//! 2. Repeat `choose_action -> step -> update` until the step reports `done`,
//!    the step cap is reached, or cancellation is requested
//! 3. Decay exploration once and append an [`EpisodeRecord`] to the run log
//!
//! # Checkpoints
//!
//! A checkpoint is written every `checkpoint_interval` episodes (counted across
//! resumed runs), unconditionally when the requested episodes are done, and
//! immediately on cancellation. Cancellation is only observed between ticks.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use horde_env::Environment;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    agent::QAgent,
    checkpoint::{Checkpoint, CheckpointError, CheckpointSink},
    run_log::{EpisodeRecord, RunLog},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Episodes between checkpoints. Zero disables periodic checkpoints.
    pub checkpoint_interval: u64,
    /// Steps after which an episode is cut short without a terminal flag.
    pub max_steps_per_episode: Option<u64>,
    /// Episodes covered by the progress summaries.
    pub summary_window: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            checkpoint_interval: 100,
            // five minutes of game time
            max_steps_per_episode: Some(18_000),
            summary_window: 100,
        }
    }
}

/// Shared stop flag. Cloned handles observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EpisodeOutcome {
    Finished(EpisodeRecord),
    /// Stopped mid-episode. The partial episode is not counted.
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingSummary {
    /// Episodes completed by this run.
    pub episodes_run: u64,
    /// Episodes completed including earlier runs.
    pub episodes_trained: u64,
    pub exploration_rate: f64,
    pub cancelled: bool,
}

/// Drives episodes of `env` with `agent`.
///
/// The trainer borrows both for its lifetime: they are built once by the
/// caller and reused across all episodes.
pub struct Trainer<'a, E, R> {
    env: &'a mut E,
    agent: &'a mut QAgent,
    rng: R,
    config: TrainerConfig,
    cancel: CancelToken,
    log: RunLog,
    episodes_trained: u64,
}

impl<'a, E, R> Trainer<'a, E, R>
where
    E: Environment,
    R: Rng,
{
    pub fn new(env: &'a mut E, agent: &'a mut QAgent, rng: R, config: TrainerConfig) -> Self {
        Self {
            env,
            agent,
            rng,
            config,
            cancel: CancelToken::new(),
            log: RunLog::new(),
            episodes_trained: 0,
        }
    }

    /// Continues the episode count of an earlier run.
    #[must_use]
    pub fn resume_from(mut self, episodes_trained: u64) -> Self {
        self.episodes_trained = episodes_trained;
        self
    }

    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[must_use]
    pub fn log(&self) -> &RunLog {
        &self.log
    }

    #[must_use]
    pub fn episodes_trained(&self) -> u64 {
        self.episodes_trained
    }

    #[must_use]
    pub fn agent(&self) -> &QAgent {
        self.agent
    }

    /// Plays and learns from one episode.
    pub fn run_episode(&mut self) -> EpisodeOutcome {
        let mut state = self.env.reset();
        let mut total_reward = 0.0;
        let mut steps = 0;
        let mut score = 0;
        let mut truncated = false;

        loop {
            if self.cancel.is_cancelled() {
                return EpisodeOutcome::Cancelled;
            }
            let action = self.agent.choose_action(&state, &mut self.rng);
            let step = self.env.step(action);
            self.agent
                .update(&state, action, step.reward, &step.state, step.done);
            total_reward += step.reward;
            steps += 1;
            score += step.kills;
            if step.done {
                break;
            }
            state = step.state;
            if self
                .config
                .max_steps_per_episode
                .is_some_and(|max| steps >= max)
            {
                truncated = true;
                break;
            }
        }

        self.agent.decay_exploration();
        self.episodes_trained += 1;
        let record = EpisodeRecord {
            episode: self.episodes_trained,
            total_reward,
            steps,
            score,
            exploration_rate: self.agent.exploration_rate(),
            truncated,
        };
        debug!(
            episode = record.episode,
            reward = record.total_reward,
            steps = record.steps,
            score = record.score,
            epsilon = record.exploration_rate,
            truncated = record.truncated,
            "episode finished"
        );
        self.log.push(record);
        EpisodeOutcome::Finished(record)
    }

    /// Runs up to `episodes` episodes, checkpointing into `sink`.
    ///
    /// `on_episode` sees every finished episode, in order.
    pub fn train<S, F>(
        &mut self,
        episodes: u64,
        sink: &mut S,
        mut on_episode: F,
    ) -> Result<TrainingSummary, CheckpointError>
    where
        S: CheckpointSink,
        F: FnMut(&EpisodeRecord),
    {
        let start = self.episodes_trained;
        info!(
            episodes,
            start_episode = start + 1,
            epsilon = self.agent.exploration_rate(),
            "training started"
        );

        let mut cancelled = false;
        for _ in 0..episodes {
            match self.run_episode() {
                EpisodeOutcome::Finished(record) => {
                    on_episode(&record);
                    let interval = self.config.checkpoint_interval;
                    if interval > 0 && record.episode % interval == 0 {
                        self.checkpoint(sink)?;
                        self.log_progress();
                    }
                }
                EpisodeOutcome::Cancelled => {
                    cancelled = true;
                    break;
                }
            }
        }

        if cancelled {
            info!(
                episodes_trained = self.episodes_trained,
                "training cancelled"
            );
        }
        self.checkpoint(sink)?;
        self.log_progress();

        Ok(TrainingSummary {
            episodes_run: self.episodes_trained - start,
            episodes_trained: self.episodes_trained,
            exploration_rate: self.agent.exploration_rate(),
            cancelled,
        })
    }

    fn checkpoint<S>(&self, sink: &mut S) -> Result<(), CheckpointError>
    where
        S: CheckpointSink,
    {
        let checkpoint = Checkpoint::from_agent(self.agent, self.episodes_trained);
        sink.save(&checkpoint)?;
        info!(
            episodes_trained = self.episodes_trained,
            epsilon = self.agent.exploration_rate(),
            "checkpoint saved"
        );
        Ok(())
    }

    fn log_progress(&self) {
        let window = self.config.summary_window;
        let (Some(reward), Some(score)) =
            (self.log.reward_stats(window), self.log.score_stats(window))
        else {
            return;
        };
        info!(
            episode = self.episodes_trained,
            window = reward.count,
            reward_mean = format_args!("{:.2}", reward.mean),
            reward_median = format_args!("{:.2}", reward.median),
            reward_min = format_args!("{:.2}", reward.min),
            reward_max = format_args!("{:.2}", reward.max),
            score_mean = format_args!("{:.2}", score.mean),
            epsilon = format_args!("{:.4}", self.agent.exploration_rate()),
            "progress"
        );
    }
}

#[cfg(test)]
mod tests {
    use horde_engine::{Action, WorldConfig};
    use horde_env::{DiscreteState, ShooterEnv, StateShape, Step};
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;
    use crate::agent::AgentParams;

    impl CheckpointSink for Vec<Checkpoint> {
        fn save(&mut self, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
            self.push(checkpoint.clone());
            Ok(())
        }
    }

    /// Walk right along a corridor until `goal`; the cell is encoded as `health`.
    struct Corridor {
        cell: u8,
        goal: u8,
        cancel_after: Option<(u64, CancelToken)>,
        steps: u64,
    }

    impl Corridor {
        fn new() -> Self {
            Self {
                cell: 0,
                goal: 3,
                cancel_after: None,
                steps: 0,
            }
        }

        fn state(&self) -> DiscreteState {
            DiscreteState {
                health: self.cell.min(3),
                ..DiscreteState::default()
            }
        }
    }

    impl Environment for Corridor {
        fn shape(&self) -> StateShape {
            StateShape::for_world(&WorldConfig::default())
        }

        fn reset(&mut self) -> DiscreteState {
            self.cell = 0;
            self.state()
        }

        fn step(&mut self, action: Action) -> Step {
            self.steps += 1;
            if let Some((after, token)) = &self.cancel_after {
                if self.steps >= *after {
                    token.cancel();
                }
            }
            match action {
                Action::MoveRight => self.cell += 1,
                Action::MoveLeft => self.cell = self.cell.saturating_sub(1),
                _ => {}
            }
            let done = self.cell == self.goal;
            if done {
                self.cell = 0;
            }
            Step {
                state: self.state(),
                reward: if done { 1.0 } else { -0.01 },
                done,
                kills: u32::from(done),
            }
        }
    }

    fn agent(shape: StateShape) -> QAgent {
        QAgent::new(shape, AgentParams::default())
    }

    #[test]
    fn test_checkpoints_at_interval_and_end() {
        let mut env = Corridor::new();
        let mut agent = agent(env.shape());
        let config = TrainerConfig {
            checkpoint_interval: 4,
            ..TrainerConfig::default()
        };
        let mut trainer = Trainer::new(&mut env, &mut agent, Pcg32::seed_from_u64(1), config);
        let mut sink = Vec::new();
        let mut seen = vec![];

        let summary = trainer
            .train(10, &mut sink, |r| seen.push(r.episode))
            .unwrap();

        assert_eq!(seen, (1..=10).collect::<Vec<_>>());
        let saved: Vec<_> = sink.iter().map(Checkpoint::episodes_trained).collect();
        assert_eq!(saved, vec![4, 8, 10]);
        assert_eq!(summary.episodes_run, 10);
        assert!(!summary.cancelled);
        assert_eq!(trainer.log().len(), 10);
        assert!(trainer.log().records().iter().all(|r| r.score == 1));
    }

    #[test]
    fn test_exploration_decays_once_per_episode() {
        let mut env = Corridor::new();
        let mut agent = agent(env.shape());
        let mut trainer = Trainer::new(
            &mut env,
            &mut agent,
            Pcg32::seed_from_u64(2),
            TrainerConfig::default(),
        );
        trainer.train(5, &mut Vec::new(), |_| {}).unwrap();
        let expected = 0.995_f64.powi(5);
        assert!((trainer.agent().exploration_rate() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_step_cap_truncates_episode() {
        let mut env = Corridor::new();
        env.goal = u8::MAX;
        let mut agent = agent(env.shape());
        let config = TrainerConfig {
            max_steps_per_episode: Some(50),
            ..TrainerConfig::default()
        };
        let mut trainer = Trainer::new(&mut env, &mut agent, Pcg32::seed_from_u64(3), config);
        let EpisodeOutcome::Finished(record) = trainer.run_episode() else {
            panic!("episode should finish");
        };
        assert!(record.truncated);
        assert_eq!(record.steps, 50);
        assert!((record.total_reward + 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_cancel_between_episodes_saves_and_stops() {
        let mut env = Corridor::new();
        let mut agent = agent(env.shape());
        let cancel = CancelToken::new();
        let mut trainer = Trainer::new(
            &mut env,
            &mut agent,
            Pcg32::seed_from_u64(4),
            TrainerConfig::default(),
        )
        .with_cancel(cancel.clone());
        let mut sink = Vec::new();

        let summary = trainer
            .train(100, &mut sink, |r| {
                if r.episode == 3 {
                    cancel.cancel();
                }
            })
            .unwrap();

        assert!(summary.cancelled);
        assert_eq!(summary.episodes_trained, 3);
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].episodes_trained(), 3);
    }

    #[test]
    fn test_cancel_mid_episode_keeps_count() {
        let cancel = CancelToken::new();
        let mut env = Corridor::new();
        env.cancel_after = Some((2, cancel.clone()));
        let mut agent = QAgent::new(
            env.shape(),
            AgentParams {
                initial_exploration: 0.0,
                ..AgentParams::default()
            },
        );
        let mut trainer = Trainer::new(
            &mut env,
            &mut agent,
            Pcg32::seed_from_u64(5),
            TrainerConfig::default(),
        )
        .resume_from(7)
        .with_cancel(cancel);
        let mut sink = Vec::new();

        let summary = trainer.train(10, &mut sink, |_| {}).unwrap();

        assert!(summary.cancelled);
        assert_eq!(summary.episodes_run, 0);
        assert_eq!(sink[0].episodes_trained(), 7);
        // no decay for the unfinished episode
        assert!((sink[0].exploration_rate() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_learns_corridor() {
        let mut env = Corridor::new();
        let mut agent = agent(env.shape());
        let mut trainer = Trainer::new(
            &mut env,
            &mut agent,
            Pcg32::seed_from_u64(6),
            TrainerConfig::default(),
        );
        trainer.train(300, &mut Vec::new(), |_| {}).unwrap();
        let start = DiscreteState::default();
        assert_eq!(trainer.agent().greedy_action(&start), Action::MoveRight);
    }

    #[test]
    fn test_seeded_training_is_reproducible() {
        let run = || {
            let mut env = ShooterEnv::with_seed(WorldConfig::default(), 9).unwrap();
            let mut agent = agent(env.shape());
            let config = TrainerConfig {
                max_steps_per_episode: Some(600),
                ..TrainerConfig::default()
            };
            let mut trainer = Trainer::new(&mut env, &mut agent, Pcg32::seed_from_u64(9), config);
            trainer.train(3, &mut Vec::new(), |_| {}).unwrap();
            (trainer.log().records().to_vec(), trainer.agent().clone())
        };
        let (records_a, agent_a) = run();
        let (records_b, agent_b) = run();
        assert_eq!(records_a, records_b);
        assert_eq!(agent_a, agent_b);
        assert!(agent_a.table().is_finite());
    }
}
