//! Tabular Q-learning for the horde environment.
//!
//! # How Training Works
//!
//! 1. **Reset** - the [`Trainer`] resets the environment and gets a discrete state
//! 2. **Act** - the [`QAgent`] picks an epsilon-greedy action
//! 3. **Learn** - the environment steps, the agent applies a one-step
//!    temporal-difference update to its [`QTable`]
//! 4. **Decay** - at the end of each episode the exploration rate shrinks toward its floor
//! 5. **Checkpoint** - every few episodes, at the end of the run, and on
//!    cancellation, the table and exploration rate are saved as a [`Checkpoint`]
//!
//! # Architecture
//!
//! ```text
//! Trainer ──drives──> Environment (horde-env)
//!    │                    │ DiscreteState, reward, done
//!    └──drives──> QAgent <┘
//!                   │ owns
//!                 QTable ──saved as──> Checkpoint (JSON)
//! ```
//!
//! The table is dense: the canonical encoding has a few hundred states, so
//! every row is allocated up front and looked up by index.
//!
//! # Example
//!
//! ```no_run
//! use horde_engine::WorldConfig;
//! use horde_env::{Environment as _, ShooterEnv};
//! use horde_training::{AgentParams, FileCheckpoint, QAgent, Trainer, TrainerConfig};
//! use rand::SeedableRng as _;
//!
//! let mut env = ShooterEnv::with_seed(WorldConfig::default(), 1)?;
//! let mut agent = QAgent::new(env.shape(), AgentParams::default());
//! let rng = rand_pcg::Pcg32::seed_from_u64(1);
//! let mut sink = FileCheckpoint::new("models/q_table.json");
//!
//! let mut trainer = Trainer::new(&mut env, &mut agent, rng, TrainerConfig::default());
//! let summary = trainer.train(500, &mut sink, |_| {})?;
//! println!("trained {} episodes", summary.episodes_trained);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use self::{
    agent::{AgentParams, AgentParamsError, QAgent},
    checkpoint::{Checkpoint, CheckpointError, CheckpointSink, FileCheckpoint},
    evaluation::evaluate,
    q_table::{ActionValues, QTable},
    run_log::{EpisodeRecord, RewardStats, RunLog},
    trainer::{CancelToken, EpisodeOutcome, Trainer, TrainerConfig, TrainingSummary},
};

pub mod agent;
pub mod checkpoint;
pub mod evaluation;
pub mod q_table;
pub mod run_log;
pub mod trainer;
