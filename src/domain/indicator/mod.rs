//! Technical indicator implementations.
//!
//! Every calculator returns an `IndicatorSeries` aligned one-to-one with its
//! input bars. Points inside the warm-up window carry `value: None`; an
//! undefined point is never represented by a placeholder number.

pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod stochastic;

pub use ema::calculate_ema;
pub use macd::calculate_macd;
pub use rsi::calculate_rsi;
pub use sma::{calculate_sma, calculate_volume_sma};
pub use stochastic::calculate_stochastic;

use crate::domain::ohlcv::PriceBar;
use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub value: Option<IndicatorValue>,
}

impl IndicatorPoint {
    pub fn is_valid(&self) -> bool {
        self.value.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorValue {
    Simple(f64),
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
    Stochastic {
        k: f64,
        d: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    VolumeSma(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Stochastic {
        k_period: usize,
        d_period: usize,
        smooth_k: usize,
    },
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// Build a single-valued series from raw optional values. Non-finite
    /// numbers are masked as undefined.
    pub(crate) fn from_simple(
        indicator_type: IndicatorType,
        bars: &[PriceBar],
        raw: Vec<Option<f64>>,
    ) -> Self {
        let values = bars
            .iter()
            .zip(raw)
            .map(|(bar, v)| IndicatorPoint {
                date: bar.date,
                value: v.filter(|x| x.is_finite()).map(IndicatorValue::Simple),
            })
            .collect();
        IndicatorSeries {
            indicator_type,
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Index of the first defined point, if any.
    pub fn first_valid_index(&self) -> Option<usize> {
        self.values.iter().position(IndicatorPoint::is_valid)
    }

    pub fn simple_at(&self, index: usize) -> Option<f64> {
        match self.values.get(index)?.value {
            Some(IndicatorValue::Simple(v)) => Some(v),
            _ => None,
        }
    }

    pub fn macd_histogram_at(&self, index: usize) -> Option<f64> {
        match self.values.get(index)?.value {
            Some(IndicatorValue::Macd { histogram, .. }) => Some(histogram),
            _ => None,
        }
    }

    pub fn stochastic_at(&self, index: usize) -> Option<(f64, f64)> {
        match self.values.get(index)?.value {
            Some(IndicatorValue::Stochastic { k, d }) => Some((k, d)),
            _ => None,
        }
    }
}

/// Trailing unweighted mean over optional values. A window containing any
/// undefined value yields `None`.
pub(crate) fn rolling_mean(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }

    (0..values.len())
        .map(|i| {
            if i + 1 < period {
                return None;
            }
            let window = &values[i + 1 - period..=i];
            let sum = window.iter().copied().sum::<Option<f64>>()?;
            Some(sum / period as f64)
        })
        .collect()
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::VolumeSma(period) => write!(f, "VOLUME_SMA({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Stochastic {
                k_period,
                d_period,
                smooth_k,
            } => write!(f, "STOCH({},{},{})", k_period, d_period, smooth_k),
        }
    }
}
