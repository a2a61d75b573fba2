//! Concrete adapter implementations for ports.

pub mod coincap_adapter;
pub mod csv_price_adapter;
pub mod csv_report_adapter;
pub mod file_config_adapter;
pub mod thread_scheduler;
