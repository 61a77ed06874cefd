//! Early trend detection: a weighted composite of five binary indicator checks.
//!
//! Each check contributes its full weight when it holds for the latest bar:
//!
//! | check     | up trend                                  | down trend                                |
//! |-----------|-------------------------------------------|-------------------------------------------|
//! | price_ma  | close > SMA10 > SMA20                     | close < SMA10 < SMA20                     |
//! | volume    | any volume ratio in lookback > threshold  | same                                      |
//! | momentum  | rsi_lower < RSI14 < rsi_upper, ROC5 > 0   | rsi_lower < RSI14 < rsi_upper, ROC5 < 0   |
//! | macd      | line crosses above signal on latest bar   | line crosses below signal on latest bar   |
//! | bollinger | middle < close < upper                    | lower < close < middle                    |
//!
//! With non-negative weights summing to 1.0 the composite lies in [0, 1].

use std::fmt;

use crate::domain::error::ScreenerError;
use crate::domain::indicator::{
    bollinger, calculate_bollinger, calculate_macd, calculate_roc, calculate_rsi, calculate_sma,
    calculate_volume_ratio, macd, rsi, volume, BollingerSeries, IndicatorSeries, MacdSeries,
};
use crate::domain::ohlcv::{closes, volumes, OhlcvBar};

pub const WEIGHT_TOLERANCE: f64 = 1e-6;
pub const STRONG_TREND_SCORE: f64 = 0.8;

const FAST_MA: usize = 10;
const SLOW_MA: usize = 20;
const MOMENTUM_ROC: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrendDirection {
    Up,
    Down,
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendDirection::Up => write!(f, "up"),
            TrendDirection::Down => write!(f, "down"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorWeights {
    pub price_ma: f64,
    pub volume: f64,
    pub momentum: f64,
    pub macd: f64,
    pub bollinger: f64,
}

impl Default for IndicatorWeights {
    fn default() -> Self {
        Self {
            price_ma: 0.20,
            volume: 0.15,
            momentum: 0.25,
            macd: 0.20,
            bollinger: 0.20,
        }
    }
}

impl IndicatorWeights {
    pub fn entries(&self) -> [(&'static str, f64); 5] {
        [
            ("price_ma", self.price_ma),
            ("volume", self.volume),
            ("momentum", self.momentum),
            ("macd", self.macd),
            ("bollinger", self.bollinger),
        ]
    }

    pub fn sum(&self) -> f64 {
        self.entries().iter().map(|(_, w)| w).sum()
    }

    pub fn is_normalized(&self) -> bool {
        (self.sum() - 1.0).abs() <= WEIGHT_TOLERANCE
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendThresholds {
    pub volume_ratio: f64,
    pub rsi_lower: f64,
    pub rsi_upper: f64,
    /// Calendar days of price history fetched per stock.
    pub history_days: u32,
}

impl Default for TrendThresholds {
    fn default() -> Self {
        Self {
            volume_ratio: 1.5,
            rsi_lower: 40.0,
            rsi_upper: 70.0,
            history_days: 180,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendSettings {
    pub lookback_period: usize,
    pub min_score: f64,
    pub weights: IndicatorWeights,
    pub thresholds: TrendThresholds,
}

impl Default for TrendSettings {
    fn default() -> Self {
        Self {
            lookback_period: 5,
            min_score: 0.6,
            weights: IndicatorWeights::default(),
            thresholds: TrendThresholds::default(),
        }
    }
}

impl TrendSettings {
    /// Bars needed before every check has a meaningful value.
    pub fn minimum_history(&self) -> usize {
        let macd_warmup = macd::DEFAULT_SLOW + macd::DEFAULT_SIGNAL;
        let volume_window = volume::DEFAULT_PERIOD + self.lookback_period.max(1) - 1;
        [
            macd_warmup,
            volume_window,
            bollinger::DEFAULT_PERIOD,
            SLOW_MA,
            rsi::DEFAULT_PERIOD + 1,
            MOMENTUM_ROC + 1,
        ]
        .into_iter()
        .max()
        .unwrap_or(macd_warmup)
    }
}

/// Per-check contributions; each is either 0 or the check's weight.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrendBreakdown {
    pub ma_score: f64,
    pub volume_score: f64,
    pub momentum_score: f64,
    pub macd_score: f64,
    pub bb_score: f64,
}

impl TrendBreakdown {
    /// No evidence of a trend in either direction.
    pub fn neutral() -> Self {
        Self::default()
    }

    pub fn total(&self) -> f64 {
        let sum = self.ma_score + self.volume_score + self.momentum_score + self.macd_score + self.bb_score;
        sum.clamp(0.0, 1.0)
    }

    pub fn entries(&self) -> [(&'static str, f64); 5] {
        [
            ("ma_score", self.ma_score),
            ("volume_score", self.volume_score),
            ("momentum_score", self.momentum_score),
            ("macd_score", self.macd_score),
            ("bb_score", self.bb_score),
        ]
    }

    /// The checks that fired, in a fixed order.
    pub fn contributing(&self) -> Vec<(&'static str, f64)> {
        self.entries().into_iter().filter(|(_, v)| *v > 0.0).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalType {
    StrongUptrend,
    PotentialUptrend,
    StrongDowntrend,
    PotentialDowntrend,
}

impl SignalType {
    fn classify(direction: TrendDirection, strength: f64) -> Self {
        let strong = strength > STRONG_TREND_SCORE;
        match (direction, strong) {
            (TrendDirection::Up, true) => SignalType::StrongUptrend,
            (TrendDirection::Up, false) => SignalType::PotentialUptrend,
            (TrendDirection::Down, true) => SignalType::StrongDowntrend,
            (TrendDirection::Down, false) => SignalType::PotentialDowntrend,
        }
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SignalType::StrongUptrend => "strong_uptrend",
            SignalType::PotentialUptrend => "potential_uptrend",
            SignalType::StrongDowntrend => "strong_downtrend",
            SignalType::PotentialDowntrend => "potential_downtrend",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendSignal {
    pub strength: f64,
    pub signal_type: SignalType,
    pub confidence: f64,
    pub breakdown: TrendBreakdown,
}

impl TrendSignal {
    /// `name=value` pairs of the checks that fired, joined with `;`.
    pub fn factors_label(&self) -> String {
        self.breakdown
            .contributing()
            .iter()
            .map(|(name, v)| format!("{}={:.3}", name, v))
            .collect::<Vec<_>>()
            .join(";")
    }
}

/// Indicator series computed once per stock.
struct TrendIndicators {
    closes: Vec<f64>,
    sma_fast: IndicatorSeries,
    sma_slow: IndicatorSeries,
    volume_ratio: IndicatorSeries,
    rsi: IndicatorSeries,
    roc: IndicatorSeries,
    macd: MacdSeries,
    bollinger: BollingerSeries,
}

impl TrendIndicators {
    fn compute(bars: &[OhlcvBar]) -> Self {
        let closes = closes(bars);
        let volumes = volumes(bars);
        Self {
            sma_fast: calculate_sma(&closes, FAST_MA),
            sma_slow: calculate_sma(&closes, SLOW_MA),
            volume_ratio: calculate_volume_ratio(&volumes, volume::DEFAULT_PERIOD),
            rsi: calculate_rsi(&closes, rsi::DEFAULT_PERIOD),
            roc: calculate_roc(&closes, MOMENTUM_ROC),
            macd: calculate_macd(
                &closes,
                macd::DEFAULT_FAST,
                macd::DEFAULT_SLOW,
                macd::DEFAULT_SIGNAL,
            ),
            bollinger: calculate_bollinger(
                &closes,
                bollinger::DEFAULT_PERIOD,
                bollinger::DEFAULT_MULT_X100,
            ),
            closes,
        }
    }

    fn close(&self) -> Option<f64> {
        self.closes.last().copied()
    }

    fn price_ma(&self, direction: TrendDirection) -> bool {
        match (self.close(), self.sma_fast.latest(), self.sma_slow.latest()) {
            (Some(c), Some(fast), Some(slow)) => match direction {
                TrendDirection::Up => c > fast && fast > slow,
                TrendDirection::Down => c < fast && fast < slow,
            },
            _ => false,
        }
    }

    fn volume(&self, lookback: usize, threshold: f64) -> bool {
        self.volume_ratio
            .tail(lookback)
            .iter()
            .flatten()
            .any(|&ratio| ratio > threshold)
    }

    fn momentum(&self, direction: TrendDirection, thresholds: &TrendThresholds) -> bool {
        match (self.rsi.latest(), self.roc.latest()) {
            (Some(rsi), Some(roc)) => {
                let in_band = rsi > thresholds.rsi_lower && rsi < thresholds.rsi_upper;
                in_band
                    && match direction {
                        TrendDirection::Up => roc > 0.0,
                        TrendDirection::Down => roc < 0.0,
                    }
            }
            _ => false,
        }
    }

    fn macd_cross(&self, direction: TrendDirection) -> bool {
        match (self.macd.back(0), self.macd.back(1)) {
            (Some(now), Some(prev)) => match direction {
                TrendDirection::Up => now.line > now.signal && prev.line <= prev.signal,
                TrendDirection::Down => now.line < now.signal && prev.line >= prev.signal,
            },
            _ => false,
        }
    }

    fn bollinger_position(&self, direction: TrendDirection) -> bool {
        match (self.close(), self.bollinger.latest()) {
            (Some(c), Some(band)) => match direction {
                TrendDirection::Up => c > band.middle && c < band.upper,
                TrendDirection::Down => c < band.middle && c > band.lower,
            },
            _ => false,
        }
    }
}

/// Scores the latest bar of `bars` (oldest first).
///
/// Fails with `InsufficientHistory` when fewer than
/// [`TrendSettings::minimum_history`] bars are available.
pub fn score_trend(
    ticker: &str,
    bars: &[OhlcvBar],
    settings: &TrendSettings,
    direction: TrendDirection,
) -> Result<TrendBreakdown, ScreenerError> {
    let minimum = settings.minimum_history();
    if bars.len() < minimum {
        return Err(ScreenerError::InsufficientHistory {
            ticker: ticker.to_string(),
            bars: bars.len(),
            minimum,
        });
    }

    let ind = TrendIndicators::compute(bars);
    let w = &settings.weights;
    let pick = |hit: bool, weight: f64| if hit { weight } else { 0.0 };

    Ok(TrendBreakdown {
        ma_score: pick(ind.price_ma(direction), w.price_ma),
        volume_score: pick(
            ind.volume(
                settings.lookback_period.max(1),
                settings.thresholds.volume_ratio,
            ),
            w.volume,
        ),
        momentum_score: pick(ind.momentum(direction, &settings.thresholds), w.momentum),
        macd_score: pick(ind.macd_cross(direction), w.macd),
        bb_score: pick(ind.bollinger_position(direction), w.bollinger),
    })
}

/// Like [`score_trend`] but degrades to the neutral breakdown on short history.
pub fn score_trend_or_neutral(
    ticker: &str,
    bars: &[OhlcvBar],
    settings: &TrendSettings,
    direction: TrendDirection,
) -> TrendBreakdown {
    score_trend(ticker, bars, settings, direction).unwrap_or_else(|e| {
        tracing::debug!(ticker, error = %e, "scoring as neutral");
        TrendBreakdown::neutral()
    })
}

/// Emits a signal when the composite reaches `settings.min_score`.
pub fn detect_trend(
    ticker: &str,
    bars: &[OhlcvBar],
    settings: &TrendSettings,
    direction: TrendDirection,
) -> Result<Option<TrendSignal>, ScreenerError> {
    let breakdown = score_trend(ticker, bars, settings, direction)?;
    let strength = breakdown.total();
    if strength < settings.min_score {
        return Ok(None);
    }
    Ok(Some(TrendSignal {
        strength,
        signal_type: SignalType::classify(direction, strength),
        confidence: strength * 100.0,
        breakdown,
    }))
}
