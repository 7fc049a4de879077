//! Port traits for the trader's external collaborators.

pub mod alert_port;
pub mod config_port;
pub mod ledger_port;
pub mod price_port;
pub mod state_port;
