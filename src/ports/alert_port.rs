//! Alert / dashboard port. Purely observational.

use crate::domain::error::BotError;
use crate::domain::indicator::IndicatorSnapshot;
use crate::domain::position::{PositionState, TradeEvent};

pub trait AlertPort {
    fn display(
        &self,
        snapshot: &IndicatorSnapshot,
        state: &PositionState,
        equity: f64,
    ) -> Result<(), BotError>;

    /// Signal a trade. Must return without waiting on the delivery.
    fn notify(&self, event: &TradeEvent) -> Result<(), BotError>;
}
