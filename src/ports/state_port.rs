//! Durable position state port.

use crate::domain::error::BotError;
use crate::domain::position::PositionState;

/// Outcome of loading persisted state.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadedState {
    /// No prior record; the configured starting state.
    Fresh(PositionState),
    /// Read back from the durable record.
    Restored(PositionState),
    /// The durable record was unreadable and the starting state was used instead.
    Recovered {
        state: PositionState,
        error: String,
    },
}

impl LoadedState {
    pub fn state(&self) -> PositionState {
        match self {
            LoadedState::Fresh(s) | LoadedState::Restored(s) => *s,
            LoadedState::Recovered { state, .. } => *state,
        }
    }
}

pub trait StatePort {
    fn load(&self) -> Result<LoadedState, BotError>;

    /// Durably replace the stored state. On error the previous record stays intact.
    fn save(&self, state: &PositionState) -> Result<(), BotError>;
}
