//! Stochastic oscillator %K/%D.
//!
//! raw %K = 100 * (close - lowest low) / (highest high - lowest low) over
//! `k_period` bars. Reported %K is the SMA(`smooth_k`) of raw %K and %D is the
//! SMA(`d_period`) of reported %K. A flat window (highest == lowest) yields a
//! raw %K of 50.0.
//!
//! With (14, 3, 3): raw %K first valid at 13, %K at 15, %D at 17. A point is
//! valid only once both %K and %D are defined.

use crate::domain::indicator::{
    rolling_mean, IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue,
};
use crate::domain::ohlcv::PriceBar;

pub const FLAT_RANGE_K: f64 = 50.0;

pub fn calculate_stochastic(
    bars: &[PriceBar],
    k_period: usize,
    d_period: usize,
    smooth_k: usize,
) -> IndicatorSeries {
    let raw_k = raw_percent_k(bars, k_period);
    let k = rolling_mean(&raw_k, smooth_k);
    let d = rolling_mean(&k, d_period);

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let value = match (k[i], d[i]) {
                (Some(k), Some(d)) if k.is_finite() && d.is_finite() => {
                    Some(IndicatorValue::Stochastic { k, d })
                }
                _ => None,
            };
            IndicatorPoint {
                date: bar.date,
                value,
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Stochastic {
            k_period,
            d_period,
            smooth_k,
        },
        values,
    }
}

pub(crate) fn raw_percent_k(bars: &[PriceBar], period: usize) -> Vec<Option<f64>> {
    (0..bars.len())
        .map(|i| {
            if period == 0 || i + 1 < period {
                return None;
            }
            let window = &bars[i + 1 - period..=i];
            let lowest = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
            let highest = window
                .iter()
                .map(|b| b.high)
                .fold(f64::NEG_INFINITY, f64::max);
            let range = highest - lowest;
            if range == 0.0 {
                Some(FLAT_RANGE_K)
            } else {
                Some(100.0 * (bars[i].close - lowest) / range)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, NaiveDate};

    fn make_bars(hlc: &[(f64, f64, f64)]) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        hlc.iter()
            .enumerate()
            .map(|(i, &(high, low, close))| PriceBar {
                date: start + Duration::days(i as i64),
                open: close,
                high,
                low,
                close,
                volume: 1000,
            })
            .collect()
    }

    fn rising(n: usize) -> Vec<(f64, f64, f64)> {
        (0..n)
            .map(|i| {
                let c = 100.0 + i as f64;
                (c + 1.0, c - 1.0, c)
            })
            .collect()
    }

    #[test]
    fn stochastic_warmup_indices() {
        let bars = make_bars(&rising(30));
        let raw = raw_percent_k(&bars, 14);
        assert_eq!(raw.iter().position(Option::is_some), Some(13));

        let series = calculate_stochastic(&bars, 14, 3, 3);
        assert_eq!(series.len(), 30);
        assert_eq!(series.first_valid_index(), Some(17));
    }

    #[test]
    fn stochastic_flat_range_is_neutral() {
        let bars = make_bars(&vec![(100.0, 100.0, 100.0); 20]);
        let series = calculate_stochastic(&bars, 14, 3, 3);

        let (k, d) = series.stochastic_at(19).unwrap();
        assert_relative_eq!(k, FLAT_RANGE_K);
        assert_relative_eq!(d, FLAT_RANGE_K);
    }

    #[test]
    fn stochastic_raw_k_formula() {
        // window: highs 12, 14, 13 lows 8, 10, 9; close 11
        let bars = make_bars(&[(12.0, 8.0, 10.0), (14.0, 10.0, 12.0), (13.0, 9.0, 11.0)]);
        let raw = raw_percent_k(&bars, 3);
        // (11 - 8) / (14 - 8) * 100 = 50
        assert_relative_eq!(raw[2].unwrap(), 50.0);
    }

    #[test]
    fn stochastic_close_at_high_is_100() {
        let bars = make_bars(&[(10.0, 5.0, 6.0), (12.0, 6.0, 12.0)]);
        let raw = raw_percent_k(&bars, 2);
        assert_relative_eq!(raw[1].unwrap(), 100.0);
    }

    #[test]
    fn stochastic_smoothing_chain() {
        let bars = make_bars(&rising(25));
        let raw = raw_percent_k(&bars, 14);
        let series = calculate_stochastic(&bars, 14, 3, 3);

        let k_at = |i: usize| (raw[i - 2].unwrap() + raw[i - 1].unwrap() + raw[i].unwrap()) / 3.0;
        let (k, d) = series.stochastic_at(20).unwrap();
        assert_relative_eq!(k, k_at(20), epsilon = 1e-12);
        assert_relative_eq!(d, (k_at(18) + k_at(19) + k_at(20)) / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn stochastic_values_stay_in_range() {
        let hlc: Vec<(f64, f64, f64)> = (0..60)
            .map(|i| {
                let c = 100.0 + (i as f64 * 0.9).sin() * 8.0;
                (c + 2.0, c - 2.0, c)
            })
            .collect();
        let series = calculate_stochastic(&make_bars(&hlc), 14, 3, 3);
        for i in 17..60 {
            let (k, d) = series.stochastic_at(i).unwrap();
            assert!((0.0..=100.0).contains(&k));
            assert!((0.0..=100.0).contains(&d));
        }
    }

    #[test]
    fn stochastic_short_input_never_valid() {
        let bars = make_bars(&rising(17));
        let series = calculate_stochastic(&bars, 14, 3, 3);
        assert_eq!(series.first_valid_index(), None);
    }
}
