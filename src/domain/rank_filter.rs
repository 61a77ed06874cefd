//! Per-side rank threshold filter.
//!
//! Rank 1 is the best fundamental composite. Long candidates come from the
//! top of the ranking (rank <= threshold), short candidates from the bottom
//! (rank >= threshold).

use std::fmt;

use crate::domain::trend::TrendDirection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Long,
    Short,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Long, Side::Short];

    pub fn trend_direction(self) -> TrendDirection {
        match self {
            Side::Long => TrendDirection::Up,
            Side::Short => TrendDirection::Down,
        }
    }

    /// Config section name under `stock_filters`.
    pub fn key(self) -> &'static str {
        match self {
            Side::Long => "long",
            Side::Short => "short",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

pub fn passes(rank: f64, threshold: f64, side: Side) -> bool {
    match side {
        Side::Long => rank <= threshold,
        Side::Short => rank >= threshold,
    }
}

/// Keeps the items whose rank passes, preserving input order.
pub fn apply<T, F>(items: &[T], rank_of: F, threshold: f64, side: Side) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> f64,
{
    items
        .iter()
        .filter(|item| passes(rank_of(item), threshold, side))
        .cloned()
        .collect()
}
