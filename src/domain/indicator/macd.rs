//! MACD (Moving Average Convergence Divergence).
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//!
//! Default parameters: fast=12, slow=26, signal=9.
//! Both EMAs are recursive from the first close, so every bar has a value;
//! callers decide how much history makes a crossover meaningful.

use crate::domain::indicator::ema::ema_raw;
use crate::domain::indicator::{IndicatorType, MacdPoint, MacdSeries};

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

pub fn calculate_macd(
    closes: &[f64],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> MacdSeries {
    let indicator_type = IndicatorType::Macd {
        fast,
        slow,
        signal: signal_period,
    };
    if fast == 0 || slow == 0 || signal_period == 0 {
        return MacdSeries {
            indicator_type,
            values: vec![None; closes.len()],
        };
    }

    let ema_fast = ema_raw(closes, fast);
    let ema_slow = ema_raw(closes, slow);
    let line: Vec<f64> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| f - s)
        .collect();
    let signal = ema_raw(&line, signal_period);

    let values = line
        .iter()
        .zip(&signal)
        .map(|(&line, &signal)| Some(MacdPoint { line, signal }))
        .collect();

    MacdSeries {
        indicator_type,
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_macd(closes: &[f64]) -> MacdSeries {
        calculate_macd(closes, DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL)
    }

    fn ramp(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64).collect()
    }

    #[test]
    fn macd_line_is_ema_fast_minus_ema_slow() {
        let closes = vec![10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 100.0];
        let series = calculate_macd(&closes, 3, 5, 2);

        let ema_fast = ema_raw(&closes, 3);
        let ema_slow = ema_raw(&closes, 5);

        for (i, point) in series.values.iter().enumerate() {
            let point = point.unwrap();
            assert!(
                (point.line - (ema_fast[i] - ema_slow[i])).abs() < f64::EPSILON,
                "MACD line mismatch at index {}",
                i
            );
        }
    }

    #[test]
    fn macd_first_point_is_flat() {
        let series = default_macd(&ramp(5));
        let first = series.values[0].unwrap();
        assert_eq!(first.line, 0.0);
        assert_eq!(first.signal, 0.0);
    }

    #[test]
    fn macd_positive_in_uptrend() {
        let series = default_macd(&ramp(60));
        let latest = series.back(0).unwrap();
        assert!(latest.line > 0.0);
        // signal lags the line in a steady uptrend
        assert!(latest.line > latest.signal);
    }

    #[test]
    fn macd_indicator_type() {
        let series = calculate_macd(&[100.0, 101.0, 102.0], 5, 10, 3);
        assert_eq!(
            series.indicator_type,
            IndicatorType::Macd {
                fast: 5,
                slow: 10,
                signal: 3
            }
        );
    }

    #[test]
    fn macd_empty_closes() {
        let series = default_macd(&[]);
        assert!(series.values.is_empty());
        assert_eq!(series.back(0), None);
    }

    #[test]
    fn macd_zero_period() {
        let closes = [100.0, 101.0, 102.0];
        assert!(calculate_macd(&closes, 0, 26, 9).values.iter().all(Option::is_none));
        assert!(calculate_macd(&closes, 12, 0, 9).values.iter().all(Option::is_none));
        assert!(calculate_macd(&closes, 12, 26, 0).values.iter().all(Option::is_none));
    }

    #[test]
    fn macd_default_constants() {
        assert_eq!(DEFAULT_FAST, 12);
        assert_eq!(DEFAULT_SLOW, 26);
        assert_eq!(DEFAULT_SIGNAL, 9);
    }
}
