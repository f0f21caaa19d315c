//! Market-wide trend gate.
//!
//! Compares the index's latest close with its simple moving average. When the
//! reading cannot be made the filter degrades to an undetermined state that
//! still permits BUY signals, so a flaky index feed never silences the bot.

use crate::domain::indicator::calculate_sma;
use crate::domain::ohlcv::PriceBar;
use std::fmt;

pub const DEFAULT_INDEX_PERIOD: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketRegime {
    Up,
    Down,
}

impl fmt::Display for MarketRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketRegime::Up => f.write_str("UP"),
            MarketRegime::Down => f.write_str("DOWN"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DegradedReason {
    InsufficientHistory { bars: usize, required: usize },
    UndefinedAverage,
    ProviderFailure(String),
}

impl fmt::Display for DegradedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DegradedReason::InsufficientHistory { bars, required } => {
                write!(f, "only {} index bars, need {}", bars, required)
            }
            DegradedReason::UndefinedAverage => f.write_str("index average undefined"),
            DegradedReason::ProviderFailure(reason) => write!(f, "index fetch failed: {}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrendReading {
    Confirmed {
        regime: MarketRegime,
        close: f64,
        average: f64,
        period: usize,
    },
    Degraded(DegradedReason),
}

impl TrendReading {
    /// Effective regime. A degraded reading reports `Up`.
    pub fn regime(&self) -> MarketRegime {
        match self {
            TrendReading::Confirmed { regime, .. } => *regime,
            TrendReading::Degraded(_) => MarketRegime::Up,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, TrendReading::Degraded(_))
    }

    /// False only for a confirmed downtrend.
    pub fn permits_buy(&self) -> bool {
        self.regime() == MarketRegime::Up
    }

    pub fn rationale(&self) -> String {
        match self {
            TrendReading::Confirmed {
                regime,
                close,
                average,
                period,
            } => match regime {
                MarketRegime::Up => {
                    format!("index {:.2} > SMA({}) {:.2} (bullish)", close, period, average)
                }
                MarketRegime::Down => {
                    format!("index {:.2} <= SMA({}) {:.2} (bearish)", close, period, average)
                }
            },
            TrendReading::Degraded(reason) => {
                format!("trend undetermined ({}), defaulting to UP", reason)
            }
        }
    }
}

/// Evaluate the trend from the latest index bar against SMA(`period`).
pub fn evaluate_trend(index_bars: &[PriceBar], period: usize) -> TrendReading {
    if period == 0 || index_bars.len() < period {
        return TrendReading::Degraded(DegradedReason::InsufficientHistory {
            bars: index_bars.len(),
            required: period,
        });
    }

    let sma = calculate_sma(index_bars, period);
    let last = index_bars.len() - 1;
    let close = index_bars[last].close;
    match sma.simple_at(last) {
        Some(average) if close.is_finite() => {
            let regime = if close > average {
                MarketRegime::Up
            } else {
                MarketRegime::Down
            };
            TrendReading::Confirmed {
                regime,
                close,
                average,
                period,
            }
        }
        _ => TrendReading::Degraded(DegradedReason::UndefinedAverage),
    }
}
