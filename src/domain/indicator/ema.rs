//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seeded with the SMA of the first n values, then
//! EMA[i] = x[i]*k + EMA[i-1]*(1-k). Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PriceBar;

pub fn calculate_ema(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    let closes: Vec<Option<f64>> = bars.iter().map(|b| Some(b.close)).collect();
    IndicatorSeries::from_simple(IndicatorType::Ema(period), bars, ema_values(&closes, period))
}

/// EMA over an optional input stream. The seed is the mean of the first
/// `period` consecutive defined inputs; an undefined input resets the seed.
pub(crate) fn ema_values(input: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; input.len()];
    if period == 0 {
        return out;
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut ema: Option<f64> = None;
    let mut seed_sum = 0.0;
    let mut seed_count = 0usize;

    for (i, value) in input.iter().enumerate() {
        let Some(x) = *value else {
            ema = None;
            seed_sum = 0.0;
            seed_count = 0;
            continue;
        };

        ema = match ema {
            Some(prev) => Some(x * k + prev * (1.0 - k)),
            None => {
                seed_sum += x;
                seed_count += 1;
                (seed_count == period).then(|| seed_sum / period as f64)
            }
        };
        out[i] = ema;
    }

    out
}
