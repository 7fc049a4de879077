#![allow(dead_code)]

use bandtrader::domain::error::BotError;
use bandtrader::domain::execution::ExecutionParams;
use bandtrader::domain::indicator::{IndicatorConfig, IndicatorSnapshot};
use bandtrader::domain::position::{PositionState, TradeEvent, TradeKind};
use bandtrader::domain::price::{PricePoint, PriceWindow};
use bandtrader::domain::trader::TraderConfig;
use bandtrader::ports::alert_port::AlertPort;
use bandtrader::ports::ledger_port::LedgerPort;
use bandtrader::ports::price_port::PricePort;
use bandtrader::ports::state_port::{LoadedState, StatePort};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::cell::{Cell, RefCell};

pub const ASSET: &str = "Bitcoin";

pub fn base_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap()
}

/// One observation per minute starting at `base_time()`.
pub fn minute_points(prices: &[f64]) -> Vec<PricePoint> {
    prices
        .iter()
        .enumerate()
        .map(|(i, &p)| PricePoint::new(base_time() + Duration::minutes(i as i64), p))
        .collect()
}

pub fn trader_config() -> TraderConfig {
    TraderConfig {
        asset: ASSET.to_string(),
        starting_cash: 1000.0,
        poll_interval: std::time::Duration::from_secs(60),
        lookback: Duration::minutes(60),
        indicators: IndicatorConfig::default(),
        execution: ExecutionParams::default(),
    }
}

/// Nineteen flat prices followed by a sharp drop: lower band touched, RSI 0.
pub fn entry_series() -> Vec<f64> {
    let mut prices = vec![100.0; 19];
    prices.push(90.0);
    prices
}

pub struct MockPricePort {
    pub prices: RefCell<Vec<f64>>,
    pub error: RefCell<Option<String>>,
}

impl MockPricePort {
    pub fn new(prices: Vec<f64>) -> Self {
        Self {
            prices: RefCell::new(prices),
            error: RefCell::new(None),
        }
    }

    pub fn push(&self, price: f64) {
        self.prices.borrow_mut().push(price);
    }

    pub fn set_prices(&self, prices: Vec<f64>) {
        *self.prices.borrow_mut() = prices;
    }

    pub fn fail_with(&self, reason: &str) {
        *self.error.borrow_mut() = Some(reason.to_string());
    }
}

impl PricePort for MockPricePort {
    fn fetch(&self, asset: &str, _lookback: Duration) -> Result<PriceWindow, BotError> {
        if let Some(reason) = self.error.borrow().as_ref() {
            return Err(BotError::DataUnavailable {
                asset: asset.to_string(),
                reason: reason.clone(),
            });
        }
        Ok(PriceWindow::from_points(
            asset,
            minute_points(&self.prices.borrow()),
        ))
    }
}

pub struct MemoryStateStore {
    pub saved: RefCell<Option<PositionState>>,
    pub starting: PositionState,
    pub fail_saves: Cell<bool>,
    pub save_calls: Cell<usize>,
}

impl MemoryStateStore {
    pub fn new(starting_cash: f64) -> Self {
        Self {
            saved: RefCell::new(None),
            starting: PositionState::new(starting_cash),
            fail_saves: Cell::new(false),
            save_calls: Cell::new(0),
        }
    }

    pub fn with_saved(self, state: PositionState) -> Self {
        *self.saved.borrow_mut() = Some(state);
        self
    }

    pub fn saved(&self) -> Option<PositionState> {
        *self.saved.borrow()
    }
}

impl StatePort for MemoryStateStore {
    fn load(&self) -> Result<LoadedState, BotError> {
        Ok(match *self.saved.borrow() {
            Some(state) => LoadedState::Restored(state),
            None => LoadedState::Fresh(self.starting),
        })
    }

    fn save(&self, state: &PositionState) -> Result<(), BotError> {
        self.save_calls.set(self.save_calls.get() + 1);
        if self.fail_saves.get() {
            return Err(BotError::StorageWrite {
                path: "memory".into(),
                reason: "disk full".into(),
            });
        }
        *self.saved.borrow_mut() = Some(*state);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingLedger {
    pub rows: RefCell<Vec<TradeEvent>>,
    pub fail: Cell<bool>,
}

impl RecordingLedger {
    pub fn kinds(&self) -> Vec<TradeKind> {
        self.rows.borrow().iter().map(|e| e.kind).collect()
    }
}

impl LedgerPort for RecordingLedger {
    fn append(&self, event: &TradeEvent) -> Result<(), BotError> {
        if self.fail.get() {
            return Err(BotError::ledger("ledger offline"));
        }
        self.rows.borrow_mut().push(event.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingAlert {
    pub displays: Cell<usize>,
    pub notified: RefCell<Vec<TradeKind>>,
    pub fail: Cell<bool>,
}

impl AlertPort for RecordingAlert {
    fn display(
        &self,
        _snapshot: &IndicatorSnapshot,
        _state: &PositionState,
        _equity: f64,
    ) -> Result<(), BotError> {
        self.displays.set(self.displays.get() + 1);
        Ok(())
    }

    fn notify(&self, event: &TradeEvent) -> Result<(), BotError> {
        if self.fail.get() {
            return Err(BotError::alert("speaker unplugged"));
        }
        self.notified.borrow_mut().push(event.kind);
        Ok(())
    }
}
