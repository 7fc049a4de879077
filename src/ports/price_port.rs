//! Price source port.

use crate::domain::error::BotError;
use crate::domain::price::PriceWindow;
use chrono::Duration;

pub trait PricePort {
    /// Recent prices for `asset` covering the last `lookback`.
    ///
    /// An unreachable source is `BotError::DataUnavailable`; an empty window is
    /// a valid result.
    fn fetch(&self, asset: &str, lookback: Duration) -> Result<PriceWindow, BotError>;
}
