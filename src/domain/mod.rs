//! Core domain types and logic.

pub mod price;
pub mod position;
pub mod execution;
pub mod indicator;
pub mod trader;
pub mod config_validation;
pub mod error;
