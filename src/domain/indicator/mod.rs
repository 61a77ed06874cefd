//! Technical indicators over daily close/volume series.
//!
//! Every indicator returns one value per input element, `None` while the
//! indicator is still warming up:
//! - `IndicatorSeries`: a single-valued series (SMA, RSI, ROC, volume ratio)
//! - `MacdSeries`: MACD line and signal line
//! - `BollingerSeries`: upper, middle and lower bands
//! - `IndicatorType`: indicator identity + parameters, used in logs and reports

pub mod bollinger;
mod ema;
pub mod macd;
pub mod roc;
pub mod rsi;
pub mod sma;
pub mod volume;

pub use bollinger::calculate_bollinger;
pub use macd::calculate_macd;
pub use roc::calculate_roc;
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;
pub use volume::calculate_volume_ratio;

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Rsi(usize),
    Roc(usize),
    VolumeRatio(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<Option<f64>>,
}

impl IndicatorSeries {
    pub fn empty(indicator_type: IndicatorType, len: usize) -> Self {
        Self {
            indicator_type,
            values: vec![None; len],
        }
    }

    /// Value `offset` bars before the latest one (`back(0)` is the latest).
    pub fn back(&self, offset: usize) -> Option<f64> {
        let len = self.values.len();
        if offset >= len {
            return None;
        }
        self.values[len - 1 - offset]
    }

    pub fn latest(&self) -> Option<f64> {
        self.back(0)
    }

    /// The last `n` values (fewer if the series is shorter).
    pub fn tail(&self, n: usize) -> &[Option<f64>] {
        let start = self.values.len().saturating_sub(n);
        &self.values[start..]
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdPoint {
    pub line: f64,
    pub signal: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<Option<MacdPoint>>,
}

impl MacdSeries {
    pub fn back(&self, offset: usize) -> Option<MacdPoint> {
        let len = self.values.len();
        if offset >= len {
            return None;
        }
        self.values[len - 1 - offset]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerPoint {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<Option<BollingerPoint>>,
}

impl BollingerSeries {
    pub fn latest(&self) -> Option<BollingerPoint> {
        self.values.last().copied().flatten()
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Roc(period) => write!(f, "ROC({})", period),
            IndicatorType::VolumeRatio(period) => write!(f, "VOLUME_RATIO({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, mult)
            }
        }
    }
}
