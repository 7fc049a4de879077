//! JSON file adapter for the persisted position state.
//!
//! Saves are staged into a temporary file in the target directory, flushed to
//! disk, and renamed over the canonical path. A reader or a restart therefore
//! sees either the previous record or the new one, never a partial write.

use crate::domain::error::BotError;
use crate::domain::position::PositionState;
use crate::ports::state_port::{LoadedState, StatePort};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const DEFAULT_STATE_FILE: &str = "state.json";

pub struct JsonStateStore {
    path: PathBuf,
    starting: PositionState,
}

impl JsonStateStore {
    pub fn new(path: impl Into<PathBuf>, starting: PositionState) -> Self {
        Self {
            path: path.into(),
            starting,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_dir(&self) -> &Path {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        }
    }

    fn write_err(&self, reason: impl ToString) -> BotError {
        BotError::StorageWrite {
            path: self.path.display().to_string(),
            reason: reason.to_string(),
        }
    }

    fn parse(&self, content: &str) -> Result<PositionState, BotError> {
        let corrupt = |reason: String| BotError::StorageCorruption {
            path: self.path.display().to_string(),
            reason,
        };
        let state: PositionState =
            serde_json::from_str(content).map_err(|e| corrupt(e.to_string()))?;
        if !state.is_well_formed() {
            return Err(corrupt(format!("invalid values: {state:?}")));
        }
        Ok(state)
    }
}

impl StatePort for JsonStateStore {
    fn load(&self) -> Result<LoadedState, BotError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok(LoadedState::Fresh(self.starting));
            }
            Err(e) => {
                let unreadable = BotError::StorageCorruption {
                    path: self.path.display().to_string(),
                    reason: e.to_string(),
                };
                return Ok(LoadedState::Recovered {
                    state: self.starting,
                    error: unreadable.to_string(),
                });
            }
        };

        match self.parse(&content) {
            Ok(state) => Ok(LoadedState::Restored(state)),
            Err(e) => Ok(LoadedState::Recovered {
                state: self.starting,
                error: e.to_string(),
            }),
        }
    }

    fn save(&self, state: &PositionState) -> Result<(), BotError> {
        let json = serde_json::to_vec_pretty(state).map_err(|e| self.write_err(e))?;

        let mut staged = NamedTempFile::new_in(self.staging_dir()).map_err(|e| self.write_err(e))?;
        staged.write_all(&json).map_err(|e| self.write_err(e))?;
        staged
            .as_file()
            .sync_all()
            .map_err(|e| self.write_err(e))?;
        staged
            .persist(&self.path)
            .map_err(|e| self.write_err(e.error))?;

        tracing::debug!(path = %self.path.display(), "state saved");
        Ok(())
    }
}
