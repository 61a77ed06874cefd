//! Simple Moving Average.
//!
//! SMA(n)[i] = mean(x[i-n+1..=i]). Warmup: first (n-1) values are `None`.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};

pub fn calculate_sma(values: &[f64], period: usize) -> IndicatorSeries {
    let indicator_type = IndicatorType::Sma(period);
    if period == 0 {
        return IndicatorSeries::empty(indicator_type, values.len());
    }

    let mut out = Vec::with_capacity(values.len());
    let mut sum = 0.0;
    for (i, &v) in values.iter().enumerate() {
        sum += v;
        if i >= period {
            sum -= values[i - period];
        }
        if i + 1 >= period {
            out.push(Some(sum / period as f64));
        } else {
            out.push(None);
        }
    }

    IndicatorSeries {
        indicator_type,
        values: out,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_warmup() {
        let series = calculate_sma(&[1.0, 2.0, 3.0, 4.0], 3);
        assert_eq!(series.values[0], None);
        assert_eq!(series.values[1], None);
        assert!(series.values[2].is_some());
        assert!(series.values[3].is_some());
    }

    #[test]
    fn sma_values() {
        let series = calculate_sma(&[1.0, 2.0, 3.0, 4.0, 10.0], 3);
        assert!((series.values[2].unwrap() - 2.0).abs() < 1e-12);
        assert!((series.values[3].unwrap() - 3.0).abs() < 1e-12);
        assert!((series.values[4].unwrap() - 17.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn sma_period_one_is_identity() {
        let series = calculate_sma(&[5.0, 6.0], 1);
        assert_eq!(series.values, vec![Some(5.0), Some(6.0)]);
    }

    #[test]
    fn sma_zero_period() {
        let series = calculate_sma(&[5.0, 6.0], 0);
        assert_eq!(series.values, vec![None, None]);
    }

    #[test]
    fn sma_shorter_than_period() {
        let series = calculate_sma(&[5.0, 6.0], 5);
        assert!(series.values.iter().all(Option::is_none));
        assert_eq!(series.indicator_type, IndicatorType::Sma(5));
    }
}
