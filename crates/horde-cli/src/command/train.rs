use std::{
    path::{Path, PathBuf},
    sync::mpsc,
    thread,
};

use anyhow::Context;
use crossterm::event::{Event, KeyCode, KeyModifiers};
use horde_env::{Environment as _, ShooterEnv};
use horde_training::{
    CancelToken, Checkpoint, CheckpointError, EpisodeRecord, FileCheckpoint, QAgent, Trainer,
    TrainerConfig, TrainingSummary,
};
use ratatui::Frame;
use tracing::{info, warn};

use crate::{
    command::config::RunConfig,
    tui::{App, RenderMode, Runtime},
    ui::widgets::TrainingDisplay,
    util::RunSeeds,
};

const DEFAULT_OUTPUT: &str = "models/q_table.json";

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct TrainArg {
    /// Number of episodes to run
    #[arg(long, default_value_t = 5000)]
    episodes: u64,
    /// Save a checkpoint every N episodes (0 saves only at the end)
    #[arg(long, default_value_t = 100)]
    checkpoint_interval: u64,
    /// Continue from this checkpoint; a missing file starts a fresh model
    #[arg(long)]
    resume: Option<PathBuf>,
    /// Checkpoint path (defaults to the resume path, else models/q_table.json)
    #[arg(long)]
    output: Option<PathBuf>,
    /// Cut episodes short after this many steps (0 disables the cap)
    #[arg(long, default_value_t = 18_000)]
    max_steps: u64,
    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,
    /// JSON file overriding world and agent settings
    #[arg(long)]
    config: Option<PathBuf>,
    /// Show a live progress screen instead of log output
    #[arg(long)]
    monitor: bool,
}

impl TrainArg {
    pub(crate) fn is_monitored(&self) -> bool {
        self.monitor
    }

    fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .or_else(|| self.resume.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT))
    }

    fn trainer_config(&self) -> TrainerConfig {
        TrainerConfig {
            checkpoint_interval: self.checkpoint_interval,
            max_steps_per_episode: (self.max_steps > 0).then_some(self.max_steps),
            ..TrainerConfig::default()
        }
    }
}

pub(crate) fn run(arg: &TrainArg) -> anyhow::Result<()> {
    let RunConfig { world, agent: params } = RunConfig::load(arg.config.as_deref())?;
    let seeds = RunSeeds::new(arg.seed);
    let mut env = ShooterEnv::with_seed(world, seeds.env)?;

    let (mut agent, episodes_trained) = match &arg.resume {
        Some(path) => match Checkpoint::load(path, &env.shape()) {
            Ok(checkpoint) => {
                info!(
                    path = %path.display(),
                    episodes_trained = checkpoint.episodes_trained(),
                    epsilon = checkpoint.exploration_rate(),
                    saved_at = %checkpoint.saved_at(),
                    "resuming from checkpoint"
                );
                let episodes = checkpoint.episodes_trained();
                (checkpoint.into_agent(params), episodes)
            }
            Err(CheckpointError::NotFound { path }) => {
                warn!(path = %path.display(), "checkpoint not found, starting a fresh model");
                (QAgent::new(env.shape(), params), 0)
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Cannot resume from {}", path.display()));
            }
        },
        None => (QAgent::new(env.shape(), params), 0),
    };

    let output = arg.output_path();
    let mut sink = FileCheckpoint::new(&output);
    let cancel = CancelToken::new();
    let trainer = Trainer::new(
        &mut env,
        &mut agent,
        seeds.policy_rng(),
        arg.trainer_config(),
    )
    .resume_from(episodes_trained)
    .with_cancel(cancel.clone());

    let summary = if arg.monitor {
        run_monitored(trainer, arg.episodes, &mut sink, cancel)?
    } else {
        run_headless(trainer, arg.episodes, &mut sink, &cancel)?
    };

    print_summary(&summary, &output);
    Ok(())
}

/// Trains on the current thread. Ctrl-C stops after saving a checkpoint.
fn run_headless(
    mut trainer: Trainer<'_, ShooterEnv, rand_pcg::Pcg32>,
    episodes: u64,
    sink: &mut FileCheckpoint,
    cancel: &CancelToken,
) -> anyhow::Result<TrainingSummary> {
    // only one handler can exist per process
    if let Err(e) = ctrlc::set_handler(interrupt_handler(cancel.clone())) {
        warn!(error = %e, "cannot install Ctrl-C handler, interrupts will not save");
    }
    Ok(trainer.train(episodes, sink, |_| {})?)
}

fn interrupt_handler(cancel: CancelToken) -> impl FnMut() + Send + 'static {
    move || {
        if !cancel.is_cancelled() {
            eprintln!("Interrupted, saving checkpoint...");
        }
        cancel.cancel();
    }
}

/// Trains on a worker thread while the terminal shows progress.
fn run_monitored(
    mut trainer: Trainer<'_, ShooterEnv, rand_pcg::Pcg32>,
    episodes: u64,
    sink: &mut FileCheckpoint,
    cancel: CancelToken,
) -> anyhow::Result<TrainingSummary> {
    let checkpoint = sink.path().display().to_string();
    let (tx, rx) = mpsc::channel();

    thread::scope(|scope| {
        let worker = scope.spawn(move || {
            trainer.train(episodes, sink, |record| {
                // the monitor may already be gone
                let _ = tx.send(*record);
            })
        });

        let mut app = MonitorApp::new(rx, cancel.clone(), episodes, checkpoint);
        let ui_result = Runtime::new().run(&mut app);
        // never leave the worker running behind a dead terminal
        cancel.cancel();

        let summary = worker
            .join()
            .map_err(|_| anyhow::anyhow!("training thread panicked"))??;
        ui_result.context("Terminal UI failed")?;
        Ok(summary)
    })
}

fn print_summary(summary: &TrainingSummary, output: &Path) {
    if summary.cancelled {
        eprintln!("Training interrupted");
    } else {
        eprintln!("Training completed");
    }
    eprintln!("  Checkpoint:       {}", output.display());
    eprintln!("  Episodes (run):   {}", summary.episodes_run);
    eprintln!("  Episodes (total): {}", summary.episodes_trained);
    eprintln!("  Exploration rate: {:.4}", summary.exploration_rate);
}

const MONITOR_FPS: f64 = 10.0;

/// Progress screen fed by the training thread.
#[derive(Debug)]
struct MonitorApp {
    rx: mpsc::Receiver<EpisodeRecord>,
    cancel: CancelToken,
    records: Vec<EpisodeRecord>,
    episodes: u64,
    checkpoint: String,
    finished: bool,
    is_exiting: bool,
}

impl MonitorApp {
    fn new(
        rx: mpsc::Receiver<EpisodeRecord>,
        cancel: CancelToken,
        episodes: u64,
        checkpoint: String,
    ) -> Self {
        Self {
            rx,
            cancel,
            records: vec![],
            episodes,
            checkpoint,
            finished: false,
            is_exiting: false,
        }
    }

    fn drain(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(record) => self.records.push(record),
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    self.finished = true;
                    break;
                }
            }
        }
    }
}

impl App for MonitorApp {
    fn init(&mut self, runtime: &mut Runtime) {
        runtime.set_tick_rate(Some(MONITOR_FPS));
        runtime.set_render_mode(RenderMode::throttled_from_rate(MONITOR_FPS));
    }

    fn should_exit(&self) -> bool {
        self.is_exiting
    }

    fn handle_event(&mut self, _runtime: &mut Runtime, event: Event) {
        let Some(key) = event.as_key_press_event() else {
            return;
        };
        let ctrl_c =
            key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl_c || matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
            self.cancel.cancel();
            self.is_exiting = true;
        }
    }

    fn draw(&self, frame: &mut Frame) {
        let display = TrainingDisplay::new(&self.records, self.episodes, 100)
            .checkpoint(&self.checkpoint)
            .finished(self.finished);
        frame.render_widget(display, frame.area());
    }

    fn update(&mut self, _runtime: &mut Runtime) {
        self.drain();
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Debug, Parser)]
    struct Cli {
        #[clap(flatten)]
        train: TrainArg,
    }

    fn parse(args: &[&str]) -> TrainArg {
        Cli::parse_from(std::iter::once("train").chain(args.iter().copied())).train
    }

    #[test]
    fn test_output_defaults_to_resume_path() {
        assert_eq!(parse(&[]).output_path(), PathBuf::from(DEFAULT_OUTPUT));
        assert_eq!(
            parse(&["--resume", "a.json"]).output_path(),
            PathBuf::from("a.json")
        );
        assert_eq!(
            parse(&["--resume", "a.json", "--output", "b.json"]).output_path(),
            PathBuf::from("b.json")
        );
    }

    #[test]
    fn test_zero_max_steps_disables_cap() {
        assert_eq!(
            parse(&["--max-steps", "0"])
                .trainer_config()
                .max_steps_per_episode,
            None
        );
        let config = parse(&["--checkpoint-interval", "7"]).trainer_config();
        assert_eq!(config.checkpoint_interval, 7);
        assert_eq!(config.max_steps_per_episode, Some(18_000));
    }

    #[test]
    fn test_headless_run_writes_checkpoint_and_resumes() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("q.json");
        let output_arg = output.to_str().unwrap();
        let args = [
            "--episodes",
            "2",
            "--max-steps",
            "200",
            "--seed",
            "1",
            "--resume",
            output_arg,
        ];

        // missing resume file starts fresh
        run(&parse(&args)).unwrap();
        let shape = horde_env::StateShape::for_world(&horde_engine::WorldConfig::default());
        assert_eq!(
            Checkpoint::load(&output, &shape)
                .unwrap()
                .episodes_trained(),
            2
        );

        run(&parse(&args)).unwrap();
        assert_eq!(
            Checkpoint::load(&output, &shape)
                .unwrap()
                .episodes_trained(),
            4
        );
    }

    #[test]
    fn test_interrupt_saves_checkpoint_and_stops() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("q.json");
        let world = horde_engine::WorldConfig::default();
        let shape = horde_env::StateShape::for_world(&world);
        let mut env = ShooterEnv::with_seed(world, 3).unwrap();
        let mut agent = QAgent::new(shape, horde_training::AgentParams::default());
        let mut sink = FileCheckpoint::new(&output);
        let cancel = CancelToken::new();
        let trainer = Trainer::new(
            &mut env,
            &mut agent,
            RunSeeds::new(Some(3)).policy_rng(),
            TrainerConfig::default(),
        )
        .resume_from(40)
        .with_cancel(cancel.clone());

        let mut handler = interrupt_handler(cancel.clone());
        handler();
        assert!(cancel.is_cancelled());

        let summary = run_headless(trainer, 1000, &mut sink, &cancel).unwrap();
        assert!(summary.cancelled);
        assert_eq!(summary.episodes_run, 0);

        let saved = Checkpoint::load(&output, &shape).unwrap();
        assert_eq!(saved.episodes_trained(), 40);
    }

    #[test]
    fn test_corrupt_resume_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("q.json");
        std::fs::write(&output, "not json").unwrap();
        let err = run(&parse(&["--episodes", "1", "--resume", output.to_str().unwrap()]))
            .unwrap_err();
        assert!(err.downcast_ref::<CheckpointError>().is_some());
    }
}
