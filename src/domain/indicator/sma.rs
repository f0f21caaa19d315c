//! Simple Moving Average over closes or volumes.
//!
//! Unweighted mean of the trailing `period` values. First valid at index
//! `period - 1`.

use crate::domain::indicator::{rolling_mean, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PriceBar;

pub fn calculate_sma(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    let closes: Vec<Option<f64>> = bars.iter().map(|b| Some(b.close)).collect();
    IndicatorSeries::from_simple(
        IndicatorType::Sma(period),
        bars,
        rolling_mean(&closes, period),
    )
}

/// SMA of traded volume, used as the baseline for volume surges.
pub fn calculate_volume_sma(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    let volumes: Vec<Option<f64>> = bars.iter().map(|b| Some(b.volume as f64)).collect();
    IndicatorSeries::from_simple(
        IndicatorType::VolumeSma(period),
        bars,
        rolling_mean(&volumes, period),
    )
}
