//! Bollinger Bands.
//!
//! - Middle: SMA over n periods
//! - Upper: Middle + (width × StdDev)
//! - Lower: Middle - (width × StdDev)
//!
//! StdDev is the moving sample standard deviation (see [`super::stddev`]).
//! Default parameters: period=20, width=2.0

use super::stddev::{calculate_sma, calculate_stddev};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
    pub std_dev: f64,
}

/// Bands over the last `period` prices, or `None` if there are fewer.
pub fn calculate_bollinger(prices: &[f64], period: usize, width: f64) -> Option<Bands> {
    let middle = calculate_sma(prices, period)?;
    let std_dev = calculate_stddev(prices, period, middle)?;

    Some(Bands {
        upper: middle + width * std_dev,
        middle,
        lower: middle - width * std_dev,
        std_dev,
    })
}
