//! Index regime check: is the broad market above its moving averages?

use std::fmt;

use crate::domain::indicator::calculate_sma;
use crate::domain::ohlcv::{closes, OhlcvBar};

pub const REGIME_PERIODS: [usize; 3] = [20, 50, 200];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regime {
    Investable,
    Avoid,
    Unknown,
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Regime::Investable => "Investable",
            Regime::Avoid => "Avoid",
            Regime::Unknown => "n/a",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexStatus {
    pub ticker: String,
    pub close: Option<f64>,
    /// One entry per [`REGIME_PERIODS`] value.
    pub regimes: [Regime; 3],
}

/// Compares the last close with each SMA. Too little history for a period
/// yields [`Regime::Unknown`] for that period only.
pub fn index_status(ticker: &str, bars: &[OhlcvBar]) -> IndexStatus {
    let closes = closes(bars);
    let last = closes.last().copied();

    let regimes = REGIME_PERIODS.map(|period| {
        let sma = calculate_sma(&closes, period).latest();
        match (last, sma) {
            (Some(close), Some(avg)) if close > avg => Regime::Investable,
            (Some(_), Some(_)) => Regime::Avoid,
            _ => Regime::Unknown,
        }
    });

    IndexStatus {
        ticker: ticker.to_string(),
        close: last,
        regimes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn bars(closes: &[f64]) -> Vec<OhlcvBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| OhlcvBar {
                ticker: "SPY".into(),
                date: start + Duration::days(i as i64),
                open: c,
                high: c,
                low: c,
                close: c,
                volume: 1_000,
            })
            .collect()
    }

    #[test]
    fn rising_market_is_investable() {
        let closes: Vec<f64> = (1..=220).map(f64::from).collect();
        let status = index_status("SPY", &bars(&closes));
        assert_eq!(status.regimes, [Regime::Investable; 3]);
        assert_eq!(status.close, Some(220.0));
    }

    #[test]
    fn falling_market_is_avoid() {
        let closes: Vec<f64> = (1..=220).rev().map(f64::from).collect();
        let status = index_status("SPY", &bars(&closes));
        assert_eq!(status.regimes, [Regime::Avoid; 3]);
    }

    #[test]
    fn short_history_is_unknown_for_long_periods() {
        let closes: Vec<f64> = (1..=30).map(f64::from).collect();
        let status = index_status("QQQ", &bars(&closes));
        assert_eq!(
            status.regimes,
            [Regime::Investable, Regime::Unknown, Regime::Unknown]
        );
    }

    #[test]
    fn no_history_is_unknown() {
        let status = index_status("IWM", &[]);
        assert_eq!(status.close, None);
        assert_eq!(status.regimes, [Regime::Unknown; 3]);
        assert_eq!(Regime::Unknown.to_string(), "n/a");
    }
}
