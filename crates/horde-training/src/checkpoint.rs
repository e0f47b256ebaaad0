//! Durable snapshots of a learning agent.
//!
//! A checkpoint is a single JSON file holding the whole action-value table, the
//! exploration rate, and enough metadata to resume a run:
//!
//! ```json
//! {
//!   "format_version": 1,
//!   "saved_at": "2026-01-01T12:00:00Z",
//!   "episodes_trained": 500,
//!   "exploration_rate": 0.0816,
//!   "shape": { "position_buckets": 5, "health_levels": 4, "phases": 3, "bearings": 9 },
//!   "q_values": [[0.0, 0.0, ...], ...]
//! }
//! ```
//!
//! Files are replaced atomically: the new content is written next to the
//! target and renamed over it, so a crash mid-write leaves the previous
//! checkpoint intact.
//!
//! Loading validates everything before any value reaches an agent. A file whose
//! shape differs from the current encoder is rejected, never resized.

use std::{
    fs::{self, File},
    io::{self, BufReader, BufWriter, Write as _},
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use horde_env::StateShape;
use serde::{Deserialize, Serialize};

use crate::{
    agent::{AgentParams, QAgent},
    q_table::{ActionValues, QTable},
};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum CheckpointError {
    #[display("checkpoint not found: {}", path.display())]
    NotFound { path: PathBuf },
    #[display("invalid checkpoint {}: {reason}", path.display())]
    Format { path: PathBuf, reason: String },
    #[display("failed to access checkpoint {}", path.display())]
    Io { path: PathBuf, source: io::Error },
}

impl CheckpointError {
    fn format(path: &Path, reason: impl Into<String>) -> Self {
        Self::Format {
            path: path.to_owned(),
            reason: reason.into(),
        }
    }

    fn io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound {
                path: path.to_owned(),
            }
        } else {
            Self::Io {
                path: path.to_owned(),
                source,
            }
        }
    }
}

/// Validated snapshot of an agent.
#[derive(Debug, Clone, PartialEq)]
pub struct Checkpoint {
    saved_at: DateTime<Utc>,
    episodes_trained: u64,
    exploration_rate: f64,
    table: QTable,
}

#[derive(Debug, Serialize, Deserialize)]
struct CheckpointFile {
    format_version: u32,
    saved_at: DateTime<Utc>,
    episodes_trained: u64,
    exploration_rate: f64,
    shape: StateShape,
    q_values: Vec<ActionValues>,
}

impl Checkpoint {
    /// Snapshot of `agent` taken now.
    #[must_use]
    pub fn from_agent(agent: &QAgent, episodes_trained: u64) -> Self {
        Self {
            saved_at: Utc::now(),
            episodes_trained,
            exploration_rate: agent.exploration_rate(),
            table: agent.table().clone(),
        }
    }

    #[must_use]
    pub fn saved_at(&self) -> DateTime<Utc> {
        self.saved_at
    }

    #[must_use]
    pub fn episodes_trained(&self) -> u64 {
        self.episodes_trained
    }

    #[must_use]
    pub fn exploration_rate(&self) -> f64 {
        self.exploration_rate
    }

    #[must_use]
    pub fn table(&self) -> &QTable {
        &self.table
    }

    /// Agent continuing from this snapshot with the given hyper-parameters.
    #[must_use]
    pub fn into_agent(self, params: AgentParams) -> QAgent {
        QAgent::from_parts(self.table, self.exploration_rate, params)
    }

    /// Writes the checkpoint to `path`, replacing any existing file atomically.
    pub fn save(&self, path: &Path) -> Result<(), CheckpointError> {
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| CheckpointError::io(dir, e))?;
        }

        let file = CheckpointFile {
            format_version: FORMAT_VERSION,
            saved_at: self.saved_at,
            episodes_trained: self.episodes_trained,
            exploration_rate: self.exploration_rate,
            shape: *self.table.shape(),
            q_values: self.table.rows().to_vec(),
        };

        let tmp_path = temp_path(path);
        let write = || -> io::Result<()> {
            let mut writer = BufWriter::new(File::create(&tmp_path)?);
            serde_json::to_writer(&mut writer, &file)?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
            Ok(())
        };
        if let Err(e) = write() {
            let _ = fs::remove_file(&tmp_path);
            return Err(CheckpointError::io(path, e));
        }
        fs::rename(&tmp_path, path).map_err(|e| CheckpointError::io(path, e))
    }

    /// Reads and validates a checkpoint written for `expected_shape`.
    pub fn load(path: &Path, expected_shape: &StateShape) -> Result<Self, CheckpointError> {
        let file = File::open(path).map_err(|e| CheckpointError::io(path, e))?;
        let file: CheckpointFile = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            if e.is_io() {
                CheckpointError::io(path, e.into())
            } else {
                CheckpointError::format(path, e.to_string())
            }
        })?;

        if file.format_version != FORMAT_VERSION {
            return Err(CheckpointError::format(
                path,
                format!(
                    "unsupported format version {} (expected {FORMAT_VERSION})",
                    file.format_version
                ),
            ));
        }
        if file.shape != *expected_shape {
            return Err(CheckpointError::format(
                path,
                format!(
                    "table shape {:?} does not match the current encoder {expected_shape:?}",
                    file.shape
                ),
            ));
        }
        if !(file.exploration_rate.is_finite() && (0.0..=1.0).contains(&file.exploration_rate)) {
            return Err(CheckpointError::format(
                path,
                format!("exploration rate {} is outside [0, 1]", file.exploration_rate),
            ));
        }
        let rows = file.q_values.len();
        let table = QTable::from_rows(file.shape, file.q_values).ok_or_else(|| {
            CheckpointError::format(
                path,
                format!(
                    "table has {rows} rows, shape needs {}",
                    file.shape.cardinality()
                ),
            )
        })?;
        if !table.is_finite() {
            return Err(CheckpointError::format(path, "table holds non-finite values"));
        }

        Ok(Self {
            saved_at: file.saved_at,
            episodes_trained: file.episodes_trained,
            exploration_rate: file.exploration_rate,
            table,
        })
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Destination for the checkpoints a trainer produces.
pub trait CheckpointSink {
    fn save(&mut self, checkpoint: &Checkpoint) -> Result<(), CheckpointError>;
}

/// Sink writing every checkpoint to one file path.
#[derive(Debug, Clone)]
pub struct FileCheckpoint {
    path: PathBuf,
}

impl FileCheckpoint {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CheckpointSink for FileCheckpoint {
    fn save(&mut self, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
        checkpoint.save(&self.path)
    }
}
