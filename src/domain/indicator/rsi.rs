//! RSI (Relative Strength Index).
//!
//! Average gain/loss are simple rolling means of the last n close-to-close
//! changes (Cutler's variant, no Wilder smoothing):
//!
//! RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//!
//! avg_loss == 0 with gains gives 100. A window with no movement at all has
//! no defined RSI and yields `None`.
//! Warmup: first n values are `None` (n changes are needed).

use crate::domain::indicator::{IndicatorSeries, IndicatorType};

pub const DEFAULT_PERIOD: usize = 14;

pub fn calculate_rsi(closes: &[f64], period: usize) -> IndicatorSeries {
    let indicator_type = IndicatorType::Rsi(period);
    if period == 0 || closes.len() < 2 {
        return IndicatorSeries::empty(indicator_type, closes.len());
    }

    let mut values = Vec::with_capacity(closes.len());
    values.push(None);

    for i in 1..closes.len() {
        if i < period {
            values.push(None);
            continue;
        }

        let mut gain = 0.0;
        let mut loss = 0.0;
        for j in (i + 1 - period)..=i {
            let change = closes[j] - closes[j - 1];
            if change > 0.0 {
                gain += change;
            } else {
                loss -= change;
            }
        }
        let avg_gain = gain / period as f64;
        let avg_loss = loss / period as f64;

        let rsi = if avg_loss == 0.0 && avg_gain == 0.0 {
            None
        } else if avg_loss == 0.0 {
            Some(100.0)
        } else {
            Some(100.0 - (100.0 / (1.0 + avg_gain / avg_loss)))
        };
        values.push(rsi);
    }

    IndicatorSeries {
        indicator_type,
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rsi_empty_and_single() {
        assert!(calculate_rsi(&[], 14).values.is_empty());
        let series = calculate_rsi(&[100.0], 14);
        assert_eq!(series.values, vec![None]);
    }

    #[test]
    fn rsi_warmup_period() {
        let closes: Vec<f64> = (1..=15).map(|i| 100.0 + (i as f64 % 5.0) * 2.0).collect();
        let series = calculate_rsi(&closes, 14);

        assert_eq!(series.values.len(), 15);
        for i in 0..14 {
            assert!(series.values[i].is_none(), "value {} should be warming up", i);
        }
        assert!(series.values[14].is_some());
    }

    #[test]
    fn rsi_all_gains_no_losses() {
        let closes: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        let series = calculate_rsi(&closes, 14);
        assert!((series.values[14].unwrap() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rsi_all_losses_no_gains() {
        let closes: Vec<f64> = (0..15).map(|i| 100.0 - i as f64).collect();
        let series = calculate_rsi(&closes, 14);
        assert!(series.values[14].unwrap().abs() < f64::EPSILON);
    }

    #[test]
    fn rsi_flat_is_undefined() {
        let series = calculate_rsi(&[50.0; 20], 14);
        assert!(series.values.iter().all(Option::is_none));
    }

    #[test]
    fn rsi_rolling_mean_known_value() {
        // changes over the window: +2, -1 → avg_gain 1, avg_loss 0.5 → RS 2 → RSI 66.67
        let series = calculate_rsi(&[10.0, 12.0, 11.0], 2);
        let expected = 100.0 - 100.0 / 3.0;
        assert!((series.values[2].unwrap() - expected).abs() < 1e-10);
    }

    #[test]
    fn rsi_window_drops_old_changes() {
        // the first big drop leaves the window on the last bar
        let series = calculate_rsi(&[20.0, 10.0, 11.0, 12.0], 2);
        assert!((series.values[3].unwrap() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rsi_in_range() {
        let closes: Vec<f64> = (1..=40)
            .map(|i| 100.0 + (i as f64 % 7.0 - 3.0) * 2.0)
            .collect();
        let series = calculate_rsi(&closes, 14);
        for rsi in series.values.iter().flatten() {
            assert!((0.0..=100.0).contains(rsi), "RSI {} out of range", rsi);
        }
    }

    #[test]
    fn rsi_zero_period() {
        let series = calculate_rsi(&[100.0, 101.0], 0);
        assert_eq!(series.values, vec![None, None]);
        assert_eq!(series.indicator_type, IndicatorType::Rsi(0));
    }
}
