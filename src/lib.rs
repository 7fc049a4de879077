//! bandtrader: Bollinger band / RSI paper trader over a local price history.
//!
//! Hexagonal architecture: indicators, the position state machine and the
//! polling orchestrator live in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
