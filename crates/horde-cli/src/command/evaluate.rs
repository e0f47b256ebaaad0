use std::path::PathBuf;

use horde_env::ShooterEnv;
use horde_training::{RewardStats, RunLog};
use tracing::info;

use crate::{
    command::config::RunConfig,
    util::{self, RunSeeds},
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct EvaluateArg {
    /// Path to the trained model (checkpoint JSON)
    model_path: PathBuf,
    /// Number of greedy episodes to play
    #[arg(long, default_value_t = 100)]
    episodes: u64,
    /// Cut episodes short after this many steps (0 disables the cap)
    #[arg(long, default_value_t = 18_000)]
    max_steps: u64,
    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,
    /// JSON file overriding world settings; must match the model's
    #[arg(long)]
    config: Option<PathBuf>,
}

pub(crate) fn run(arg: &EvaluateArg) -> anyhow::Result<()> {
    let EvaluateArg {
        model_path,
        episodes,
        max_steps,
        seed,
        config,
    } = arg;

    let RunConfig { world, agent } = RunConfig::load(config.as_deref())?;
    let model = util::read_model_file(model_path, &world)?;
    info!(
        path = %model_path.display(),
        episodes_trained = model.episodes_trained(),
        "evaluating model"
    );
    let agent = model.into_agent(agent);
    let seeds = RunSeeds::new(*seed);
    let mut env = ShooterEnv::with_seed(world, seeds.env)?;

    let max_steps = (*max_steps > 0).then_some(*max_steps);
    let log = horde_training::evaluate(&mut env, &agent, *episodes, max_steps);
    print_report(&log);
    Ok(())
}

fn print_report(log: &RunLog) {
    let window = log.len();
    let truncated = log.records().iter().filter(|r| r.truncated).count();
    let steps = RewardStats::new(log.records().iter().map(|r| steps_as_f64(r.steps)));

    println!("Episodes:  {} ({truncated} hit the step cap)", log.len());
    print_stats("Reward", log.reward_stats(window));
    print_stats("Kills", log.score_stats(window));
    print_stats("Steps", steps);
}

#[expect(clippy::cast_precision_loss)]
fn steps_as_f64(steps: u64) -> f64 {
    steps as f64
}

fn print_stats(label: &str, stats: Option<RewardStats>) {
    match stats {
        Some(RewardStats {
            min,
            max,
            mean,
            median,
            std_dev,
            ..
        }) => println!(
            "{label:<10} mean {mean:>9.2}  median {median:>9.2}  min {min:>9.2}  max {max:>9.2}  sd {std_dev:>8.2}"
        ),
        None => println!("{label:<10} -"),
    }
}
