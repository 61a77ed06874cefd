//! Core domain types and logic.

pub mod ohlcv;
pub mod indicator;
pub mod trend;
pub mod rank_filter;
pub mod ranking;
pub mod portfolio;
pub mod market;
pub mod momentum;
pub mod screen;
pub mod report;
pub mod config;
pub mod config_validation;
pub mod error;
