//! Daily OHLCV bar representation.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub ticker: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl OhlcvBar {
    /// (high + low + close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// (high - low) / open, the intraday range relative to the open.
    /// Zero when the open is zero.
    pub fn range_pct(&self) -> f64 {
        if self.open == 0.0 {
            0.0
        } else {
            (self.high - self.low) / self.open
        }
    }

    /// True when the bar closed below its open.
    pub fn is_down_day(&self) -> bool {
        self.close < self.open
    }
}

pub fn closes(bars: &[OhlcvBar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

pub fn volumes(bars: &[OhlcvBar]) -> Vec<f64> {
    bars.iter().map(|b| b.volume as f64).collect()
}
