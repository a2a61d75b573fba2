//! Core domain types and logic.

pub mod rolling_window;
pub mod sma;
pub mod signal;
pub mod ledger;
pub mod simulation;
pub mod controller;
pub mod config_validation;
pub mod error;
