//! Per-date indicator frame for one instrument.
//!
//! An `IndicatorFrame` is recomputed in full from a bar slice. Each row holds
//! the bar's close and volume alongside every indicator the classifier reads;
//! an indicator that is still warming up (or came out non-finite) is `None`.

use crate::domain::indicator::macd::{DEFAULT_FAST, DEFAULT_SIGNAL, DEFAULT_SLOW};
use crate::domain::indicator::{
    calculate_macd, calculate_rsi, calculate_sma, calculate_stochastic, calculate_volume_sma,
};
use crate::domain::ohlcv::PriceBar;
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorParams {
    pub stoch_k: usize,
    pub stoch_d: usize,
    pub stoch_smooth: usize,
    pub trend_sma: usize,
    pub rsi: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub volume_sma: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            stoch_k: 14,
            stoch_d: 3,
            stoch_smooth: 3,
            trend_sma: 60,
            rsi: 14,
            macd_fast: DEFAULT_FAST,
            macd_slow: DEFAULT_SLOW,
            macd_signal: DEFAULT_SIGNAL,
            volume_sma: 5,
        }
    }
}

impl IndicatorParams {
    /// Index of the first bar at which every core indicator is defined.
    pub fn warmup(&self) -> usize {
        let stochastic = (self.stoch_k + self.stoch_smooth + self.stoch_d).saturating_sub(3);
        let trend = self.trend_sma.saturating_sub(1);
        let macd = (self.macd_fast.max(self.macd_slow) + self.macd_signal).saturating_sub(2);
        stochastic.max(trend).max(self.rsi).max(macd)
    }

    /// Bars needed before the classifier has two complete rows to compare.
    pub fn min_bars_for_signal(&self) -> usize {
        self.warmup() + 2
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorRow {
    pub date: NaiveDate,
    pub close: f64,
    pub volume: i64,
    pub stoch_k: Option<f64>,
    pub stoch_d: Option<f64>,
    pub trend_sma: Option<f64>,
    pub rsi: Option<f64>,
    pub macd_hist: Option<f64>,
    pub volume_sma: Option<f64>,
}

impl IndicatorRow {
    /// True when every indicator the classifier needs is defined.
    pub fn is_complete(&self) -> bool {
        self.stoch_k.is_some()
            && self.stoch_d.is_some()
            && self.trend_sma.is_some()
            && self.rsi.is_some()
            && self.macd_hist.is_some()
    }

    /// Today's volume relative to its moving average. `None` when the
    /// average is undefined or not positive.
    pub fn volume_ratio(&self) -> Option<f64> {
        self.volume_sma
            .filter(|avg| *avg > 0.0)
            .map(|avg| self.volume as f64 / avg)
    }
}

#[derive(Debug, Clone)]
pub struct IndicatorFrame {
    pub params: IndicatorParams,
    rows: Vec<IndicatorRow>,
}

impl IndicatorFrame {
    pub fn compute(bars: &[PriceBar], params: IndicatorParams) -> Self {
        let stoch = calculate_stochastic(bars, params.stoch_k, params.stoch_d, params.stoch_smooth);
        let trend = calculate_sma(bars, params.trend_sma);
        let rsi = calculate_rsi(bars, params.rsi);
        let macd = calculate_macd(bars, params.macd_fast, params.macd_slow, params.macd_signal);
        let volume = calculate_volume_sma(bars, params.volume_sma);

        let rows = bars
            .iter()
            .enumerate()
            .map(|(i, bar)| {
                let kd = stoch.stochastic_at(i);
                IndicatorRow {
                    date: bar.date,
                    close: bar.close,
                    volume: bar.volume,
                    stoch_k: kd.map(|(k, _)| k),
                    stoch_d: kd.map(|(_, d)| d),
                    trend_sma: trend.simple_at(i),
                    rsi: rsi.simple_at(i),
                    macd_hist: macd.macd_histogram_at(i),
                    volume_sma: volume.simple_at(i),
                }
            })
            .collect();

        Self::from_rows(params, rows)
    }

    /// Build a frame from precomputed rows, e.g. values produced elsewhere.
    pub fn from_rows(params: IndicatorParams, rows: Vec<IndicatorRow>) -> Self {
        Self { params, rows }
    }

    pub fn rows(&self) -> &[IndicatorRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows with every core indicator defined, in date order.
    pub fn complete_rows(&self) -> Vec<&IndicatorRow> {
        self.rows.iter().filter(|r| r.is_complete()).collect()
    }

    /// The final two rows as `(yesterday, today)`.
    pub fn latest_pair(&self) -> Option<(&IndicatorRow, &IndicatorRow)> {
        match self.rows.as_slice() {
            [.., yesterday, today] => Some((yesterday, today)),
            _ => None,
        }
    }
}
