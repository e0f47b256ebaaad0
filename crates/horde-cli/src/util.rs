use std::{
    fs,
    io::{self, Write as _},
    path::Path,
};

use anyhow::Context;
use horde_engine::WorldConfig;
use horde_env::StateShape;
use horde_training::Checkpoint;
use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg32;
use serde::{Serialize, de::DeserializeOwned};
use tracing_subscriber::EnvFilter;

/// Parses a JSON document. `kind` names the file in error messages.
pub fn read_json<T>(kind: &str, path: &Path) -> anyhow::Result<T>
where
    T: DeserializeOwned,
{
    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read {kind} file {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("{} is not a valid {kind} file", path.display()))
}

/// Writes pretty JSON to `path`, creating missing directories, or to stdout.
pub fn write_json<T>(value: &T, path: Option<&Path>) -> anyhow::Result<()>
where
    T: Serialize,
{
    let mut text = serde_json::to_string_pretty(value).context("Cannot encode JSON")?;
    text.push('\n');

    let Some(path) = path else {
        let mut out = io::stdout().lock();
        return out
            .write_all(text.as_bytes())
            .and_then(|()| out.flush())
            .context("Cannot write to stdout");
    };
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create directory {}", dir.display()))?;
    }
    fs::write(path, text).with_context(|| format!("Cannot write {}", path.display()))
}

/// Loads a trained model for playback. A missing file is an error.
pub fn read_model_file<P>(path: P, world: &WorldConfig) -> anyhow::Result<Checkpoint>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    Checkpoint::load(path, &StateShape::for_world(world))
        .with_context(|| format!("Failed to load model file: {}", path.display()))
}

/// Installs the stderr log subscriber. `RUST_LOG` overrides the default `info` level.
///
/// Only for headless commands: log lines would corrupt a full-screen UI.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Seeds for the environment and the policy.
///
/// Both derive from `seed` when given, so the whole run is reproducible.
/// Otherwise they come from the OS random source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSeeds {
    pub env: u64,
    pub policy: u64,
}

impl RunSeeds {
    pub fn new(seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(seed) => Pcg32::seed_from_u64(seed),
            None => Pcg32::from_rng(&mut rand::rng()),
        };
        Self {
            env: rng.random(),
            policy: rng.random(),
        }
    }

    pub fn policy_rng(&self) -> Pcg32 {
        Pcg32::seed_from_u64(self.policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_seed_is_reproducible() {
        assert_eq!(RunSeeds::new(Some(3)), RunSeeds::new(Some(3)));
        let seeds = RunSeeds::new(Some(3));
        assert_ne!(seeds.env, seeds.policy);
    }

    #[test]
    fn test_json_file_round_trip_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/run.json");
        let value = vec![1.5_f64, -2.0];
        write_json(&value, Some(&path)).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.ends_with("]\n"));
        let read: Vec<f64> = read_json("test", &path).unwrap();
        assert_eq!(read, value);
    }

    #[test]
    fn test_read_errors_name_the_file_kind() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        let err = read_json::<u32>("config", &missing).unwrap_err();
        assert!(err.to_string().starts_with("Cannot read config file"));

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{").unwrap();
        let err = read_json::<u32>("config", &broken).unwrap_err();
        assert!(err.to_string().ends_with("is not a valid config file"));
        assert!(err.downcast_ref::<serde_json::Error>().is_some());
    }
}
