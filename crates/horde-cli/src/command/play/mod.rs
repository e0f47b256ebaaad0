use std::path::PathBuf;

use anyhow::Context as _;

use crate::{
    command::{config::RunConfig, play::app::PlayApp},
    tui::Runtime,
    util::{self, RunSeeds},
};

mod app;
mod screens;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ManualPlayArg {
    /// Seed for a reproducible spawn sequence
    #[clap(long)]
    seed: Option<u64>,
    /// JSON file overriding world settings
    #[clap(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct AutoPlayArg {
    /// Path to the trained model (checkpoint JSON)
    model_path: PathBuf,
    /// Run in turbo mode
    #[clap(long, default_value_t = false)]
    turbo: bool,
    /// Seed for a reproducible spawn sequence
    #[clap(long)]
    seed: Option<u64>,
    /// JSON file overriding world settings; must match the model's
    #[clap(long)]
    config: Option<PathBuf>,
    /// Start a new episode after this many steps (0 disables the cap)
    #[clap(long, default_value_t = 18_000)]
    max_steps: u64,
}

pub(crate) fn run_manual(arg: &ManualPlayArg) -> anyhow::Result<()> {
    let ManualPlayArg { seed, config } = arg;

    let RunConfig { world, .. } = RunConfig::load(config.as_deref())?;
    let seeds = RunSeeds::new(*seed);
    let mut app = PlayApp::manual(world, seeds.env)?;

    Runtime::new().run(&mut app).context("Terminal UI failed")
}

pub(crate) fn run_auto(arg: &AutoPlayArg) -> anyhow::Result<()> {
    let AutoPlayArg {
        model_path,
        turbo,
        seed,
        config,
        max_steps,
    } = arg;

    let RunConfig { world, agent } = RunConfig::load(config.as_deref())?;
    let model = util::read_model_file(model_path, &world)?;
    let seeds = RunSeeds::new(*seed);
    let max_steps = (*max_steps > 0).then_some(*max_steps);
    let mut app = PlayApp::auto(world, seeds.env, model.into_agent(agent), max_steps, *turbo)?;

    Runtime::new().run(&mut app).context("Terminal UI failed")
}
