use clap::{Parser, Subcommand};

use self::{
    config::ConfigArg,
    evaluate::EvaluateArg,
    inspect::InspectArg,
    play::{AutoPlayArg, ManualPlayArg},
    train::TrainArg,
};
use crate::util;

pub(crate) mod config;
mod evaluate;
mod inspect;
mod play;
mod train;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Play the game yourself
    #[command(name = "play")]
    ManualPlay(#[clap(flatten)] ManualPlayArg),
    /// Watch a trained model play
    #[command(name = "auto-play")]
    AutoPlay(#[clap(flatten)] AutoPlayArg),
    /// Train a Q-learning model
    Train(#[clap(flatten)] TrainArg),
    /// Play a trained model headless and report statistics
    Evaluate(#[clap(flatten)] EvaluateArg),
    /// Show what a trained model has learned
    Inspect(#[clap(flatten)] InspectArg),
    /// Print the default configuration as JSON
    Config(#[clap(flatten)] ConfigArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args
        .mode
        .unwrap_or(Mode::ManualPlay(ManualPlayArg::default()))
    {
        Mode::ManualPlay(arg) => play::run_manual(&arg)?,
        Mode::AutoPlay(arg) => play::run_auto(&arg)?,
        Mode::Train(arg) => {
            if !arg.is_monitored() {
                util::init_logging();
            }
            train::run(&arg)?;
        }
        Mode::Evaluate(arg) => {
            util::init_logging();
            evaluate::run(&arg)?;
        }
        Mode::Inspect(arg) => inspect::run(&arg)?,
        Mode::Config(arg) => config::run(&arg)?,
    }
    Ok(())
}
