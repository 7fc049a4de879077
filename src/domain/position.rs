//! Simulated position state and the trade events that change it.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_STARTING_CASH: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Flat,
    Long,
}

/// Cash versus asset holdings of the single simulated position.
///
/// Fully-in or fully-out: after any transition at most one of
/// `cash_balance` and `asset_quantity` is positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionState {
    pub cash_balance: f64,
    pub asset_quantity: f64,
    pub entry_price: f64,
}

impl PositionState {
    pub fn new(starting_cash: f64) -> Self {
        PositionState {
            cash_balance: starting_cash,
            asset_quantity: 0.0,
            entry_price: 0.0,
        }
    }

    pub fn phase(&self) -> Phase {
        if self.asset_quantity > 0.0 {
            Phase::Long
        } else {
            Phase::Flat
        }
    }

    pub fn is_long(&self) -> bool {
        self.phase() == Phase::Long
    }

    /// Cash plus mark-to-market value of held quantity.
    pub fn equity(&self, price: f64) -> f64 {
        self.cash_balance + self.asset_quantity * price
    }

    /// Percent move of `price` relative to the entry price; 0 when flat.
    pub fn change_pct(&self, price: f64) -> f64 {
        if !self.is_long() || self.entry_price <= 0.0 {
            return 0.0;
        }
        (price - self.entry_price) / self.entry_price * 100.0
    }

    /// True when every field is finite and non-negative and the position is
    /// either all cash or all asset.
    pub fn is_well_formed(&self) -> bool {
        [self.cash_balance, self.asset_quantity, self.entry_price]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0)
            && !(self.is_long() && self.entry_price == 0.0)
            && !(self.cash_balance > 0.0 && self.asset_quantity > 0.0)
    }
}

impl Default for PositionState {
    fn default() -> Self {
        PositionState::new(DEFAULT_STARTING_CASH)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TradeKind {
    Buy,
    Sell,
    StopLoss,
}

impl TradeKind {
    pub fn label(&self) -> &'static str {
        match self {
            TradeKind::Buy => "BUY",
            TradeKind::Sell => "SELL",
            TradeKind::StopLoss => "STOP_LOSS",
        }
    }
}

impl fmt::Display for TradeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One position-changing transition. Append-only.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeEvent {
    pub timestamp: NaiveDateTime,
    pub kind: TradeKind,
    pub price: f64,
    pub quantity: f64,
    pub realized_pnl_pct: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_state() -> PositionState {
        PositionState {
            cash_balance: 0.0,
            asset_quantity: 2.0,
            entry_price: 100.0,
        }
    }

    #[test]
    fn new_state_is_flat() {
        let state = PositionState::new(500.0);
        assert_eq!(state.phase(), Phase::Flat);
        assert_eq!(state.cash_balance, 500.0);
        assert_eq!(state.asset_quantity, 0.0);
    }

    #[test]
    fn default_uses_starting_cash() {
        assert_eq!(PositionState::default().cash_balance, DEFAULT_STARTING_CASH);
    }

    #[test]
    fn equity_marks_to_market() {
        assert!((long_state().equity(110.0) - 220.0).abs() < f64::EPSILON);
        assert!((PositionState::new(750.0).equity(110.0) - 750.0).abs() < f64::EPSILON);
    }

    #[test]
    fn change_pct_long_and_flat() {
        assert!((long_state().change_pct(98.2) - (-1.8)).abs() < 1e-9);
        assert_eq!(PositionState::new(100.0).change_pct(98.2), 0.0);
    }

    #[test]
    fn well_formed_rejects_negative_and_nan() {
        assert!(long_state().is_well_formed());
        assert!(PositionState::new(0.0).is_well_formed());

        let mut bad = long_state();
        bad.cash_balance = -1.0;
        assert!(!bad.is_well_formed());

        let mut bad = long_state();
        bad.asset_quantity = f64::NAN;
        assert!(!bad.is_well_formed());

        let mut bad = long_state();
        bad.entry_price = 0.0;
        assert!(!bad.is_well_formed());
    }

    #[test]
    fn well_formed_rejects_cash_and_asset_together() {
        let mixed = PositionState {
            cash_balance: 500.0,
            asset_quantity: 1.0,
            entry_price: 100.0,
        };
        assert!(!mixed.is_well_formed());
    }

    #[test]
    fn serializes_with_canonical_field_names() {
        let json = serde_json::to_string(&long_state()).unwrap();
        assert!(json.contains("\"cashBalance\""));
        assert!(json.contains("\"assetQuantity\""));
        assert!(json.contains("\"entryPrice\""));
    }

    #[test]
    fn trade_kind_labels() {
        assert_eq!(TradeKind::Buy.to_string(), "BUY");
        assert_eq!(TradeKind::Sell.to_string(), "SELL");
        assert_eq!(TradeKind::StopLoss.to_string(), "STOP_LOSS");
    }
}
