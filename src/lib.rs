//! trendscreen: fundamental ranking and trend screening of equities.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`]. The [`cli`] module wires them
//! together.

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
pub mod logging;
