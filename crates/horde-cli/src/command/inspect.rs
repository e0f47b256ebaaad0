use std::{
    io::{self, Write},
    path::PathBuf,
};

use anyhow::Context as _;
use horde_training::Checkpoint;

use crate::{command::config::RunConfig, util};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct InspectArg {
    /// Path to the trained model (checkpoint JSON)
    model_path: PathBuf,
    /// JSON file overriding world settings; must match the model's
    #[arg(long)]
    config: Option<PathBuf>,
}

pub(crate) fn run(arg: &InspectArg) -> anyhow::Result<()> {
    let InspectArg { model_path, config } = arg;

    let RunConfig { world, .. } = RunConfig::load(config.as_deref())?;
    let model = util::read_model_file(model_path, &world)?;
    let phase_names: Vec<&str> = world.phases.iter().map(|p| p.name.as_str()).collect();

    let mut out = io::stdout().lock();
    write_report(&mut out, &model, &phase_names).context("Failed to write report to stdout")
}

/// Metadata block followed by one line per visited state.
fn write_report<W>(out: &mut W, model: &Checkpoint, phase_names: &[&str]) -> io::Result<()>
where
    W: Write,
{
    let table = model.table();
    let shape = table.shape();
    let visited: Vec<_> = table.visited().collect();

    writeln!(
        out,
        "Saved at:          {}",
        model.saved_at().format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(out, "Episodes trained:  {}", model.episodes_trained())?;
    writeln!(out, "Exploration rate:  {:.4}", model.exploration_rate())?;
    writeln!(
        out,
        "States:            {} ({} positions x {} health x {} phases x {} bearings)",
        shape.cardinality(),
        shape.position_buckets,
        shape.health_levels,
        shape.phases,
        shape.bearings
    )?;
    writeln!(out, "Visited states:    {}", visited.len())?;
    if visited.is_empty() {
        return Ok(());
    }

    writeln!(out)?;
    writeln!(
        out,
        "{:<12} {:>6} {:<10} {:<10} {:<12} {:>10}",
        "POSITION", "HEALTH", "PHASE", "NEAREST", "BEST", "VALUE"
    )?;
    for (state, values) in visited {
        let best = table.best_action(&state);
        let phase = phase_names
            .get(usize::from(state.phase))
            .copied()
            .unwrap_or("-");
        writeln!(
            out,
            "{:<12} {:>6} {:<10} {:<10} {:<12} {:>10.3}",
            state.position.label(),
            state.health,
            phase,
            state.bearing.label(),
            best.label(),
            values[best.id()]
        )?;
    }
    out.flush()
}
