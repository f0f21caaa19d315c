//! Subscriber and outbound message types for the live scan.

use chrono::{DateTime, FixedOffset};

use crate::domain::signal::{Signal, SignalKind};

/// One recipient following one symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub symbol: String,
    pub recipient: String,
}

/// Valuation figures attached to an actionable signal. Any of them may be
/// missing at the source.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Fundamentals {
    pub pe: Option<f64>,
    pub eps: Option<f64>,
    /// Percent, e.g. 2.1 for 2.1%.
    pub dividend_yield: Option<f64>,
}

impl Fundamentals {
    pub fn is_empty(&self) -> bool {
        self.pe.is_none() && self.eps.is_none() && self.dividend_yield.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub symbol: String,
    pub signal: Signal,
    pub fundamentals: Option<Fundamentals>,
    pub timestamp: DateTime<FixedOffset>,
}

impl Notification {
    pub fn kind(&self) -> SignalKind {
        self.signal.kind
    }

    pub fn volume_ratio(&self) -> Option<f64> {
        self.signal.evidence.volume_ratio
    }

    /// True when the volume ratio reaches `threshold`.
    pub fn is_volume_surge(&self, threshold: f64) -> bool {
        self.volume_ratio().is_some_and(|ratio| ratio >= threshold)
    }
}
