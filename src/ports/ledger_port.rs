//! Append-only trade ledger port.

use crate::domain::error::BotError;
use crate::domain::position::TradeEvent;

pub trait LedgerPort {
    fn append(&self, event: &TradeEvent) -> Result<(), BotError>;
}
