//! Console dashboard and trade alerts.
//!
//! `notify` hands the event to a worker thread over a channel and returns
//! immediately; the worker prints the alert line and rings the terminal bell
//! (once for a buy, twice for an exit, three times for a stop-loss).

use crate::domain::error::BotError;
use crate::domain::indicator::IndicatorSnapshot;
use crate::domain::position::{PositionState, TradeEvent, TradeKind};
use crate::ports::alert_port::AlertPort;
use std::io::{self, Write};
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

pub struct ConsoleAlert {
    tx: Option<Sender<TradeEvent>>,
    worker: Option<JoinHandle<()>>,
}

impl ConsoleAlert {
    pub fn spawn(bell: bool) -> Result<Self, BotError> {
        let (tx, rx) = mpsc::channel::<TradeEvent>();
        let worker = thread::Builder::new()
            .name("alerts".into())
            .spawn(move || {
                for event in rx {
                    let mut out = io::stdout().lock();
                    let rings = if bell { bell_count(event.kind) } else { 0 };
                    let _ = writeln!(
                        out,
                        "{}*** {} @ ${:.2} | qty {:.6} | pnl {:+.2}% ***",
                        "\x07".repeat(rings),
                        event.kind,
                        event.price,
                        event.quantity,
                        event.realized_pnl_pct
                    );
                    let _ = out.flush();
                }
            })
            .map_err(BotError::alert)?;

        Ok(Self {
            tx: Some(tx),
            worker: Some(worker),
        })
    }
}

fn bell_count(kind: TradeKind) -> usize {
    match kind {
        TradeKind::Buy => 1,
        TradeKind::Sell => 2,
        TradeKind::StopLoss => 3,
    }
}

pub fn render_dashboard(snapshot: &IndicatorSnapshot, state: &PositionState, equity: f64) -> String {
    let rule = "=".repeat(40);
    let position = if state.is_long() {
        format!(
            "LONG {:.6} @ ${:.2} ({:+.2}%)",
            state.asset_quantity,
            state.entry_price,
            state.change_pct(snapshot.current_price)
        )
    } else {
        "FLAT".to_string()
    };
    format!(
        "{rule}\nNET WORTH: ${equity:.2} | {position}\nRSI: {:.2} | PRICE: ${:.2}\nLOWER: ${:.2} | UPPER: ${:.2}\n{rule}",
        snapshot.rsi, snapshot.current_price, snapshot.lower_band, snapshot.upper_band,
    )
}

impl AlertPort for ConsoleAlert {
    fn display(
        &self,
        snapshot: &IndicatorSnapshot,
        state: &PositionState,
        equity: f64,
    ) -> Result<(), BotError> {
        let mut out = io::stdout().lock();
        writeln!(out, "{}", render_dashboard(snapshot, state, equity)).map_err(BotError::alert)?;
        out.flush().map_err(BotError::alert)
    }

    fn notify(&self, event: &TradeEvent) -> Result<(), BotError> {
        match &self.tx {
            Some(tx) => tx.send(event.clone()).map_err(BotError::alert),
            None => Err(BotError::alert("alert worker stopped")),
        }
    }
}

impl Drop for ConsoleAlert {
    fn drop(&mut self) {
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn snapshot() -> IndicatorSnapshot {
        IndicatorSnapshot {
            current_price: 101.0,
            sma: 100.0,
            std_dev: 1.0,
            upper_band: 102.0,
            lower_band: 98.0,
            rsi: 55.5,
            sma_period: 20,
            rsi_period: 14,
        }
    }

    #[test]
    fn dashboard_flat() {
        let text = render_dashboard(&snapshot(), &PositionState::new(1000.0), 1000.0);
        assert!(text.contains("NET WORTH: $1000.00 | FLAT"));
        assert!(text.contains("RSI: 55.50 | PRICE: $101.00"));
        assert!(text.contains("LOWER: $98.00 | UPPER: $102.00"));
    }

    #[test]
    fn dashboard_long_shows_entry() {
        let state = PositionState {
            cash_balance: 0.0,
            asset_quantity: 2.0,
            entry_price: 100.0,
        };
        let text = render_dashboard(&snapshot(), &state, 202.0);
        assert!(text.contains("LONG 2.000000 @ $100.00 (+1.00%)"));
    }

    #[test]
    fn bell_distinguishes_kinds() {
        assert_eq!(bell_count(TradeKind::Buy), 1);
        assert_eq!(bell_count(TradeKind::Sell), 2);
        assert_eq!(bell_count(TradeKind::StopLoss), 3);
    }

    #[test]
    fn notify_returns_without_blocking() {
        let alert = ConsoleAlert::spawn(false).unwrap();
        let event = TradeEvent {
            timestamp: NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            kind: TradeKind::Sell,
            price: 105.0,
            quantity: 1.0,
            realized_pnl_pct: 5.0,
        };
        for _ in 0..100 {
            alert.notify(&event).unwrap();
        }
        drop(alert);
    }
}
