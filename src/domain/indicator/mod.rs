//! Indicator engine: turns a price window into a trend/volatility snapshot.
//!
//! - `IndicatorConfig`: periods and band width
//! - `IndicatorSnapshot`: SMA, standard deviation, Bollinger bands, RSI and the latest price
//! - `Indicators`: either a snapshot or "not enough data yet"
//!
//! Everything here is a pure function of the window. Sums are always folded
//! left-to-right so repeated evaluation is bit-identical.

pub mod bollinger;
pub mod rsi;
pub mod stddev;

use crate::domain::price::PriceWindow;

pub const DEFAULT_SMA_PERIOD: usize = 20;
pub const DEFAULT_RSI_PERIOD: usize = 14;
pub const DEFAULT_BAND_WIDTH: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorConfig {
    pub sma_period: usize,
    pub rsi_period: usize,
    pub band_width: f64,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        IndicatorConfig {
            sma_period: DEFAULT_SMA_PERIOD,
            rsi_period: DEFAULT_RSI_PERIOD,
            band_width: DEFAULT_BAND_WIDTH,
        }
    }
}

impl IndicatorConfig {
    /// Number of points needed before a snapshot can be produced.
    pub fn min_window(&self) -> usize {
        self.sma_period.max(self.rsi_period + 1)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSnapshot {
    pub current_price: f64,
    pub sma: f64,
    pub std_dev: f64,
    pub upper_band: f64,
    pub lower_band: f64,
    pub rsi: f64,
    pub sma_period: usize,
    pub rsi_period: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Indicators {
    Ready(IndicatorSnapshot),
    InsufficientData { have: usize, need: usize },
}

impl Indicators {
    pub fn snapshot(&self) -> Option<&IndicatorSnapshot> {
        match self {
            Indicators::Ready(s) => Some(s),
            Indicators::InsufficientData { .. } => None,
        }
    }
}

pub fn compute(window: &PriceWindow, config: &IndicatorConfig) -> Indicators {
    let need = config.min_window();
    let prices = window.prices();
    if prices.len() < need || config.sma_period == 0 || config.rsi_period == 0 {
        return Indicators::InsufficientData {
            have: prices.len(),
            need,
        };
    }

    let bands = bollinger::calculate_bollinger(&prices, config.sma_period, config.band_width);
    let rsi = rsi::calculate_rsi(&prices, config.rsi_period);

    match (bands, rsi, prices.last()) {
        (Some(bands), Some(rsi), Some(&current_price)) => Indicators::Ready(IndicatorSnapshot {
            current_price,
            sma: bands.middle,
            std_dev: bands.std_dev,
            upper_band: bands.upper,
            lower_band: bands.lower,
            rsi,
            sma_period: config.sma_period,
            rsi_period: config.rsi_period,
        }),
        _ => Indicators::InsufficientData {
            have: prices.len(),
            need,
        },
    }
}
