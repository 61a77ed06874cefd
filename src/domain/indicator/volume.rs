//! Volume ratio: volume / SMA(n) of volume.
//!
//! Warmup: first (n-1) values are `None`. A zero average volume yields `None`.

use crate::domain::indicator::{calculate_sma, IndicatorSeries, IndicatorType};

pub const DEFAULT_PERIOD: usize = 20;

pub fn calculate_volume_ratio(volumes: &[f64], period: usize) -> IndicatorSeries {
    let average = calculate_sma(volumes, period);
    let values = volumes
        .iter()
        .zip(&average.values)
        .map(|(&v, avg)| match avg {
            Some(avg) if *avg > 0.0 => Some(v / avg),
            _ => None,
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::VolumeRatio(period),
        values,
    }
}
