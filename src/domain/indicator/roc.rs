//! ROC (Rate of Change).
//!
//! ROC(n)[i] = ((C[i] - C[i-n]) / C[i-n]) * 100
//! If C[i-n] == 0: ROC = 0
//! Warmup: first n values are `None`.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};

pub fn calculate_roc(closes: &[f64], period: usize) -> IndicatorSeries {
    let values = closes
        .iter()
        .enumerate()
        .map(|(i, &curr)| {
            if i < period || period == 0 {
                return None;
            }
            let prev = closes[i - period];
            if prev == 0.0 {
                Some(0.0)
            } else {
                Some((curr - prev) / prev * 100.0)
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Roc(period),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roc_warmup() {
        let series = calculate_roc(&[10.0, 11.0, 12.0, 13.0], 2);
        assert_eq!(series.values[0], None);
        assert_eq!(series.values[1], None);
        assert!(series.values[2].is_some());
    }

    #[test]
    fn roc_basic_calculation() {
        let series = calculate_roc(&[100.0, 105.0, 110.0], 2);
        assert!((series.values[2].unwrap() - 10.0).abs() < 1e-10);
    }

    #[test]
    fn roc_negative() {
        let series = calculate_roc(&[100.0, 90.0], 1);
        assert!((series.values[1].unwrap() + 10.0).abs() < 1e-10);
    }

    #[test]
    fn roc_zero_previous_close() {
        let series = calculate_roc(&[0.0, 10.0], 1);
        assert_eq!(series.values[1], Some(0.0));
    }

    #[test]
    fn roc_zero_period_is_undefined() {
        let series = calculate_roc(&[1.0, 2.0], 0);
        assert_eq!(series.values, vec![None, None]);
    }
}
