//! Polling orchestrator.
//!
//! `Trader` owns the single mutable `PositionState` slot. One cycle runs to
//! completion before the next starts:
//!
//! 1. retry ledger rows that failed to append earlier
//! 2. fetch the price window and trim it to the retention horizon
//! 3. compute indicators (a short window is "no signal", not an error)
//! 4. evaluate the state machine
//! 5. persist the successor state, and only then commit it to the slot
//! 6. append the trade to the ledger and notify alerts
//!
//! A failed save leaves the slot at the last durably persisted state.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDateTime};
use tracing::{debug, error, info, warn};

use super::error::BotError;
use super::execution::{self, ExecutionParams};
use super::indicator::{self, IndicatorConfig, IndicatorSnapshot, Indicators};
use super::position::{PositionState, TradeEvent};
use crate::ports::alert_port::AlertPort;
use crate::ports::ledger_port::LedgerPort;
use crate::ports::price_port::PricePort;
use crate::ports::state_port::{LoadedState, StatePort};

#[derive(Debug, Clone, PartialEq)]
pub struct TraderConfig {
    pub asset: String,
    pub starting_cash: f64,
    pub poll_interval: Duration,
    pub lookback: chrono::Duration,
    pub indicators: IndicatorConfig,
    pub execution: ExecutionParams,
}

/// Trade events kept for a later ledger retry before the oldest are dropped.
pub const MAX_PENDING_LEDGER: usize = 1024;

/// What a completed cycle did.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    NoSignal { have: usize, need: usize },
    Hold(IndicatorSnapshot),
    Traded {
        snapshot: IndicatorSnapshot,
        event: TradeEvent,
    },
}

pub struct Trader<'a> {
    config: TraderConfig,
    prices: &'a dyn PricePort,
    store: &'a dyn StatePort,
    ledger: &'a dyn LedgerPort,
    alerts: &'a dyn AlertPort,
    state: PositionState,
    pending_ledger: VecDeque<TradeEvent>,
    pending_cap: usize,
}

impl<'a> Trader<'a> {
    /// Load the persisted state and build a trader around it.
    pub fn start(
        config: TraderConfig,
        prices: &'a dyn PricePort,
        store: &'a dyn StatePort,
        ledger: &'a dyn LedgerPort,
        alerts: &'a dyn AlertPort,
    ) -> Result<Self, BotError> {
        let loaded = store.load()?;
        match &loaded {
            LoadedState::Fresh(s) => {
                info!(cash = s.cash_balance, "no saved state, starting fresh")
            }
            LoadedState::Restored(s) => info!(
                cash = s.cash_balance,
                quantity = s.asset_quantity,
                entry = s.entry_price,
                "restored saved state"
            ),
            LoadedState::Recovered { state, error } => warn!(
                %error,
                cash = state.cash_balance,
                "saved state unreadable, simulated capital reset to starting balance"
            ),
        }

        Ok(Trader {
            config,
            prices,
            store,
            ledger,
            alerts,
            state: loaded.state(),
            pending_ledger: VecDeque::new(),
            pending_cap: MAX_PENDING_LEDGER,
        })
    }

    /// Bound the ledger retry queue to `cap` events (at least one).
    pub fn with_ledger_backlog(mut self, cap: usize) -> Self {
        self.pending_cap = cap.max(1);
        self
    }

    pub fn state(&self) -> &PositionState {
        &self.state
    }

    pub fn config(&self) -> &TraderConfig {
        &self.config
    }

    /// Trade events still waiting for a successful ledger append.
    pub fn pending_ledger(&self) -> usize {
        self.pending_ledger.len()
    }

    pub fn run_cycle(&mut self) -> Result<CycleOutcome, BotError> {
        self.run_cycle_at(Local::now().naive_local())
    }

    pub fn run_cycle_at(&mut self, now: NaiveDateTime) -> Result<CycleOutcome, BotError> {
        self.flush_ledger();

        let mut window = self.prices.fetch(&self.config.asset, self.config.lookback)?;
        if window.is_empty() {
            return Err(BotError::DataUnavailable {
                asset: self.config.asset.clone(),
                reason: "price source returned no rows".into(),
            });
        }
        window.trim_to(self.config.indicators.min_window());
        debug!(points = window.len(), asset = %self.config.asset, "price window loaded");

        let snapshot = match indicator::compute(&window, &self.config.indicators) {
            Indicators::Ready(snapshot) => snapshot,
            Indicators::InsufficientData { have, need } => {
                debug!(have, need, "not enough prices for a signal yet");
                return Ok(CycleOutcome::NoSignal { have, need });
            }
        };

        let equity = self.state.equity(snapshot.current_price);
        if let Err(e) = self.alerts.display(&snapshot, &self.state, equity) {
            warn!(error = %e, "dashboard update failed");
        }

        let Some(transition) =
            execution::evaluate(&self.state, &snapshot, &self.config.execution, now)
        else {
            return Ok(CycleOutcome::Hold(snapshot));
        };

        if let Err(e) = self.store.save(&transition.state) {
            error!(
                error = %e,
                kind = %transition.event.kind,
                "state save failed, transition not applied"
            );
            return Err(e);
        }
        self.state = transition.state;

        let event = transition.event;
        info!(
            kind = %event.kind,
            price = event.price,
            quantity = event.quantity,
            pnl_pct = event.realized_pnl_pct,
            cash = self.state.cash_balance,
            "trade applied"
        );

        self.queue_ledger(event.clone());
        self.flush_ledger();

        if let Err(e) = self.alerts.notify(&event) {
            warn!(error = %e, kind = %event.kind, "trade alert not delivered");
        }

        Ok(CycleOutcome::Traded { snapshot, event })
    }

    fn queue_ledger(&mut self, event: TradeEvent) {
        while self.pending_ledger.len() >= self.pending_cap {
            if let Some(dropped) = self.pending_ledger.pop_front() {
                error!(
                    kind = %dropped.kind,
                    price = dropped.price,
                    timestamp = %dropped.timestamp,
                    cap = self.pending_cap,
                    "ledger backlog full, oldest trade row dropped"
                );
            }
        }
        self.pending_ledger.push_back(event);
    }

    fn flush_ledger(&mut self) {
        while let Some(event) = self.pending_ledger.front() {
            match self.ledger.append(event) {
                Ok(()) => {
                    self.pending_ledger.pop_front();
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        pending = self.pending_ledger.len(),
                        "ledger append failed, will retry next cycle"
                    );
                    return;
                }
            }
        }
    }
}

/// The first tick strictly after `now`, stepping from `scheduled` in whole intervals.
///
/// Ticks that passed while a cycle was still running are skipped, not queued.
/// Never earlier than `now`, and falls back to `now` when the clock arithmetic
/// would overflow.
pub fn next_tick(scheduled: Instant, interval: Duration, now: Instant) -> Instant {
    let Some(next) = scheduled.checked_add(interval) else {
        return now;
    };
    if next > now || interval.is_zero() {
        return next.max(now);
    }
    let behind = now.duration_since(next).as_nanos();
    let skipped = u32::try_from(behind / interval.as_nanos() + 1).unwrap_or(u32::MAX);
    interval
        .checked_mul(skipped)
        .and_then(|step| next.checked_add(step))
        .map_or(now, |tick| tick.max(now))
}

/// Run cycles on the configured interval. Returns the number of cycles run.
///
/// No cycle error stops the loop; `max_cycles` bounds it for supervised runs.
pub fn run_loop(trader: &mut Trader<'_>, max_cycles: Option<u64>) -> u64 {
    let interval = trader.config.poll_interval;
    let mut cycles = 0u64;
    let mut scheduled = Instant::now();

    loop {
        match trader.run_cycle() {
            Ok(CycleOutcome::Traded { event, .. }) => {
                debug!(kind = %event.kind, "cycle complete")
            }
            Ok(CycleOutcome::Hold(s)) => debug!(
                price = s.current_price,
                rsi = s.rsi,
                lower = s.lower_band,
                upper = s.upper_band,
                "holding"
            ),
            Ok(CycleOutcome::NoSignal { have, need }) => {
                info!(have, need, "waiting for more price data")
            }
            Err(e @ BotError::DataUnavailable { .. }) => warn!(error = %e, "cycle skipped"),
            Err(e) => error!(error = %e, "cycle failed"),
        }
        cycles += 1;

        if max_cycles.is_some_and(|max| cycles >= max) {
            return cycles;
        }

        let now = Instant::now();
        let next = next_tick(scheduled, interval, now);
        let overrun = next.duration_since(scheduled) > interval;
        if overrun {
            warn!(
                elapsed_ms = now.duration_since(scheduled).as_millis() as u64,
                "cycle overran its interval, skipping missed ticks"
            );
        }
        std::thread::sleep(next.saturating_duration_since(Instant::now()));
        scheduled = next;
    }
}
