//! CSV trade ledger adapter.
//!
//! Append-only file with columns `timestamp,action,price,quantity,pnl_pct`.
//! The header row is written only when the file is new or empty.

use crate::domain::error::BotError;
use crate::domain::position::TradeEvent;
use crate::ports::ledger_port::LedgerPort;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

pub const DEFAULT_LEDGER_FILE: &str = "trade_history.csv";
pub const LEDGER_HEADER: [&str; 5] = ["timestamp", "action", "price", "quantity", "pnl_pct"];
const LEDGER_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

pub struct CsvLedger {
    path: PathBuf,
}

impl CsvLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LedgerPort for CsvLedger {
    fn append(&self, event: &TradeEvent) -> Result<(), BotError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| BotError::ledger(format!("{}: {}", self.path.display(), e)))?;
        let needs_header = file.metadata().map_err(BotError::ledger)?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if needs_header {
            writer.write_record(LEDGER_HEADER).map_err(BotError::ledger)?;
        }
        writer
            .write_record([
                event.timestamp.format(LEDGER_TIMESTAMP_FORMAT).to_string(),
                event.kind.label().to_string(),
                event.price.to_string(),
                event.quantity.to_string(),
                event.realized_pnl_pct.to_string(),
            ])
            .map_err(BotError::ledger)?;
        writer.flush().map_err(BotError::ledger)?;
        Ok(())
    }
}
