//! Position state machine: entry/exit decisions and fee-adjusted fills.
//!
//! Two phases, `Flat` and `Long`. Entry fires on a lower-band touch with weak
//! RSI; exit fires on stop-loss (checked first) or an upper-band touch. Fills
//! are immediate at the observed price with a proportional fee on each side.
//!
//! [`evaluate`] is pure: it never mutates the input state and returns the
//! successor state together with the event that produced it.

use chrono::NaiveDateTime;

use super::indicator::IndicatorSnapshot;
use super::position::{Phase, PositionState, TradeEvent, TradeKind};

pub const DEFAULT_RSI_ENTRY: f64 = 35.0;
pub const DEFAULT_STOP_LOSS_PCT: f64 = 1.7;
pub const DEFAULT_FEE_RATE: f64 = 0.001;

/// Strategy thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionParams {
    /// Entry requires RSI strictly below this.
    pub rsi_entry: f64,
    /// Stop-loss distance from entry, in percent.
    pub stop_loss_pct: f64,
    /// Proportional fee charged on each fill, as a fraction.
    pub fee_rate: f64,
}

impl Default for ExecutionParams {
    fn default() -> Self {
        ExecutionParams {
            rsi_entry: DEFAULT_RSI_ENTRY,
            stop_loss_pct: DEFAULT_STOP_LOSS_PCT,
            fee_rate: DEFAULT_FEE_RATE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: PositionState,
    pub event: TradeEvent,
}

/// Decide the next state for `state` given `snapshot`.
///
/// Returns `None` when no condition is met; the caller must then leave state
/// and storage untouched.
pub fn evaluate(
    state: &PositionState,
    snapshot: &IndicatorSnapshot,
    params: &ExecutionParams,
    now: NaiveDateTime,
) -> Option<Transition> {
    match state.phase() {
        Phase::Flat => try_enter(state, snapshot, params, now),
        Phase::Long => try_exit(state, snapshot, params, now),
    }
}

fn try_enter(
    state: &PositionState,
    snapshot: &IndicatorSnapshot,
    params: &ExecutionParams,
    now: NaiveDateTime,
) -> Option<Transition> {
    let price = snapshot.current_price;
    let triggered = price <= snapshot.lower_band
        && snapshot.rsi < params.rsi_entry
        && state.cash_balance > 0.0
        && price > 0.0;
    if !triggered {
        return None;
    }

    let quantity = state.cash_balance * (1.0 - params.fee_rate) / price;
    Some(Transition {
        state: PositionState {
            cash_balance: 0.0,
            asset_quantity: quantity,
            entry_price: price,
        },
        event: TradeEvent {
            timestamp: now,
            kind: TradeKind::Buy,
            price,
            quantity,
            realized_pnl_pct: 0.0,
        },
    })
}

fn try_exit(
    state: &PositionState,
    snapshot: &IndicatorSnapshot,
    params: &ExecutionParams,
    now: NaiveDateTime,
) -> Option<Transition> {
    let price = snapshot.current_price;
    let change = (price - state.entry_price) / state.entry_price;

    let kind = if change <= -params.stop_loss_pct / 100.0 {
        TradeKind::StopLoss
    } else if price >= snapshot.upper_band {
        TradeKind::Sell
    } else {
        return None;
    };

    let revenue = state.asset_quantity * price;
    Some(Transition {
        state: PositionState {
            cash_balance: revenue * (1.0 - params.fee_rate),
            asset_quantity: 0.0,
            entry_price: 0.0,
        },
        event: TradeEvent {
            timestamp: now,
            kind,
            price,
            quantity: state.asset_quantity,
            realized_pnl_pct: change * 100.0,
        },
    })
}
