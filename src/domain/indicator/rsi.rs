//! RSI (Relative Strength Index) with Wilder smoothing.
//!
//! - First average: simple mean of the first n gains/losses
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! RSI = 100 - (100 / (1 + avg_gain / avg_loss)), and 100 when avg_loss == 0.
//! Warmup: first n bars are invalid (n price changes are needed).

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PriceBar;

pub fn calculate_rsi(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    let mut raw = vec![None; bars.len()];

    if period > 0 && bars.len() > period {
        let changes: Vec<f64> = bars.windows(2).map(|w| w[1].close - w[0].close).collect();
        let gain = |c: f64| c.max(0.0);
        let loss = |c: f64| (-c).max(0.0);

        let mut avg_gain = changes[..period].iter().map(|&c| gain(c)).sum::<f64>() / period as f64;
        let mut avg_loss = changes[..period].iter().map(|&c| loss(c)).sum::<f64>() / period as f64;
        raw[period] = Some(rsi_from_averages(avg_gain, avg_loss));

        let n = period as f64;
        for (offset, &change) in changes.iter().enumerate().skip(period) {
            avg_gain = (avg_gain * (n - 1.0) + gain(change)) / n;
            avg_loss = (avg_loss * (n - 1.0) + loss(change)) / n;
            raw[offset + 1] = Some(rsi_from_averages(avg_gain, avg_loss));
        }
    }

    IndicatorSeries::from_simple(IndicatorType::Rsi(period), bars, raw)
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}
