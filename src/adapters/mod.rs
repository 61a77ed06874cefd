//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod csv_store;
pub mod file_config_adapter;
pub mod fundamentals_csv;
pub mod outbox_notifier;
pub mod portfolio_csv;
