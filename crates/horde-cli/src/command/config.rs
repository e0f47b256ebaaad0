use std::path::{Path, PathBuf};

use anyhow::Context;
use horde_engine::WorldConfig;
use horde_training::AgentParams;
use serde::{Deserialize, Serialize};

use crate::util;

/// Contents of a `--config` file. Omitted fields keep their defaults.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub world: WorldConfig,
    pub agent: AgentParams,
}

impl RunConfig {
    /// Defaults, or the given file.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let config: Self = match path {
            Some(path) => util::read_json("config", path)?,
            None => Self::default(),
        };
        config.world.validate().context("Invalid world configuration")?;
        config.agent.validate().context("Invalid agent configuration")?;
        Ok(config)
    }
}

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ConfigArg {
    /// Output file path (defaults to stdout)
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &ConfigArg) -> anyhow::Result<()> {
    util::write_json(&RunConfig::default(), arg.output.as_deref())
}
