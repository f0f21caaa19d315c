//! Two-day signal classifier.
//!
//! Compares today's indicator row against yesterday's and emits one of
//! BUY, SELL, HOLD or no signal. Pure and memory-less: the same pair of rows
//! always yields the same signal.
//!
//! Priority:
//! 1. oversold, golden cross, price above trend SMA, rising histogram: BUY
//! 2. overbought and death cross: HOLD when RSI is passivated, else SELL
//! 3. otherwise no signal

use crate::domain::error::SignalError;
use crate::domain::frame::{IndicatorFrame, IndicatorRow};
use chrono::NaiveDate;
use std::fmt;

/// Classifier thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalRules {
    /// %K strictly below this is oversold.
    pub oversold: f64,
    /// %K strictly above this is overbought.
    pub overbought: f64,
    /// RSI strictly above this converts a SELL into a HOLD.
    pub passivation_rsi: f64,
}

impl Default for SignalRules {
    fn default() -> Self {
        Self {
            oversold: 20.0,
            overbought: 80.0,
            passivation_rsi: 70.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    None,
    Buy,
    Sell,
    Hold,
}

impl SignalKind {
    /// Anything other than `None` is worth telling someone about.
    pub fn is_actionable(&self) -> bool {
        !matches!(self, SignalKind::None)
    }

    pub fn label(&self) -> &'static str {
        match self {
            SignalKind::None => "NONE",
            SignalKind::Buy => "BUY",
            SignalKind::Sell => "SELL",
            SignalKind::Hold => "HOLD",
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The numbers a signal was decided on.
#[derive(Debug, Clone, PartialEq)]
pub struct Evidence {
    pub date: NaiveDate,
    pub price: f64,
    pub k: f64,
    pub d: f64,
    pub rsi: f64,
    pub volume_ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub kind: SignalKind,
    pub evidence: Evidence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Predicates {
    pub trend_up: bool,
    pub momentum_up: bool,
    pub gold_cross: bool,
    pub dead_cross: bool,
    pub oversold: bool,
    pub overbought: bool,
    pub passivated: bool,
}

impl Predicates {
    pub fn evaluate(
        today: &IndicatorRow,
        yesterday: &IndicatorRow,
        rules: &SignalRules,
    ) -> Result<Self, SignalError> {
        let now = CoreValues::from_row(today)?;
        let prev = CoreValues::from_row(yesterday)?;

        Ok(Self {
            trend_up: today.close > now.trend_sma,
            momentum_up: now.macd_hist > prev.macd_hist,
            gold_cross: prev.k < prev.d && now.k > now.d,
            dead_cross: prev.k > prev.d && now.k < now.d,
            oversold: now.k < rules.oversold,
            overbought: now.k > rules.overbought,
            passivated: now.rsi > rules.passivation_rsi,
        })
    }

    pub fn kind(&self) -> SignalKind {
        if self.oversold && self.gold_cross && self.trend_up && self.momentum_up {
            SignalKind::Buy
        } else if self.overbought && self.dead_cross {
            if self.passivated {
                SignalKind::Hold
            } else {
                SignalKind::Sell
            }
        } else {
            SignalKind::None
        }
    }
}

struct CoreValues {
    k: f64,
    d: f64,
    trend_sma: f64,
    rsi: f64,
    macd_hist: f64,
}

impl CoreValues {
    fn from_row(row: &IndicatorRow) -> Result<Self, SignalError> {
        let require = |value: Option<f64>, field: &'static str| {
            value.ok_or(SignalError::UndefinedIndicator {
                date: row.date,
                field,
            })
        };
        Ok(Self {
            k: require(row.stoch_k, "stoch_k")?,
            d: require(row.stoch_d, "stoch_d")?,
            trend_sma: require(row.trend_sma, "trend_sma")?,
            rsi: require(row.rsi, "rsi")?,
            macd_hist: require(row.macd_hist, "macd_hist")?,
        })
    }
}

/// Classify `today` against the preceding trading day.
pub fn classify(
    today: &IndicatorRow,
    yesterday: &IndicatorRow,
    rules: &SignalRules,
) -> Result<Signal, SignalError> {
    let predicates = Predicates::evaluate(today, yesterday, rules)?;
    let now = CoreValues::from_row(today)?;

    Ok(Signal {
        kind: predicates.kind(),
        evidence: Evidence {
            date: today.date,
            price: today.close,
            k: now.k,
            d: now.d,
            rsi: now.rsi,
            volume_ratio: today.volume_ratio(),
        },
    })
}

/// Classify the final two rows of a frame.
pub fn classify_latest(frame: &IndicatorFrame, rules: &SignalRules) -> Result<Signal, SignalError> {
    let (yesterday, today) = frame
        .latest_pair()
        .ok_or(SignalError::InsufficientData {
            rows: frame.len(),
            required: 2,
        })?;
    classify(today, yesterday, rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::frame::IndicatorParams;
    use proptest::prelude::*;

    fn row(day: u32, close: f64, k: f64, d: f64, rsi: f64, hist: f64) -> IndicatorRow {
        IndicatorRow {
            date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            close,
            volume: 2000,
            stoch_k: Some(k),
            stoch_d: Some(d),
            trend_sma: Some(100.0),
            rsi: Some(rsi),
            macd_hist: Some(hist),
            volume_sma: Some(1000.0),
        }
    }

    #[test]
    fn buy_on_oversold_gold_cross_in_uptrend() {
        let yesterday = row(1, 104.0, 15.0, 18.0, 35.0, -0.5);
        let today = row(2, 105.0, 19.0, 17.0, 40.0, -0.2);

        let signal = classify(&today, &yesterday, &SignalRules::default()).unwrap();
        assert_eq!(signal.kind, SignalKind::Buy);
        assert_eq!(signal.evidence.price, 105.0);
        assert_eq!(signal.evidence.k, 19.0);
        assert_eq!(signal.evidence.volume_ratio, Some(2.0));
    }

    #[test]
    fn no_buy_below_trend() {
        let yesterday = row(1, 95.0, 15.0, 18.0, 35.0, -0.5);
        let today = row(2, 96.0, 19.0, 17.0, 40.0, -0.2);
        let signal = classify(&today, &yesterday, &SignalRules::default()).unwrap();
        assert_eq!(signal.kind, SignalKind::None);
    }

    #[test]
    fn no_buy_when_histogram_falls() {
        let yesterday = row(1, 104.0, 15.0, 18.0, 35.0, -0.1);
        let today = row(2, 105.0, 19.0, 17.0, 40.0, -0.2);
        let signal = classify(&today, &yesterday, &SignalRules::default()).unwrap();
        assert_eq!(signal.kind, SignalKind::None);
    }

    #[test]
    fn no_buy_when_not_oversold() {
        let yesterday = row(1, 104.0, 20.0, 22.0, 35.0, -0.5);
        let today = row(2, 105.0, 25.0, 21.0, 40.0, -0.2);
        let signal = classify(&today, &yesterday, &SignalRules::default()).unwrap();
        assert_eq!(signal.kind, SignalKind::None);
    }

    #[test]
    fn sell_on_overbought_dead_cross() {
        let yesterday = row(1, 110.0, 88.0, 85.0, 45.0, 0.4);
        let today = row(2, 109.0, 82.0, 84.0, 40.0, 0.3);
        let signal = classify(&today, &yesterday, &SignalRules::default()).unwrap();
        assert_eq!(signal.kind, SignalKind::Sell);
    }

    #[test]
    fn hold_when_rsi_passivated() {
        let yesterday = row(1, 110.0, 88.0, 85.0, 78.0, 0.4);
        let today = row(2, 109.0, 82.0, 84.0, 75.0, 0.3);
        let signal = classify(&today, &yesterday, &SignalRules::default()).unwrap();
        assert_eq!(signal.kind, SignalKind::Hold);
    }

    #[test]
    fn rsi_exactly_at_threshold_is_not_passivated() {
        let yesterday = row(1, 110.0, 88.0, 85.0, 70.0, 0.4);
        let today = row(2, 109.0, 82.0, 84.0, 70.0, 0.3);
        let signal = classify(&today, &yesterday, &SignalRules::default()).unwrap();
        assert_eq!(signal.kind, SignalKind::Sell);
    }

    #[test]
    fn equal_k_and_d_is_not_a_cross() {
        let yesterday = row(1, 104.0, 15.0, 15.0, 35.0, -0.5);
        let today = row(2, 105.0, 19.0, 17.0, 40.0, -0.2);
        let preds = Predicates::evaluate(&today, &yesterday, &SignalRules::default()).unwrap();
        assert!(!preds.gold_cross);
        assert!(!preds.dead_cross);
    }

    #[test]
    fn custom_thresholds() {
        let rules = SignalRules {
            oversold: 30.0,
            ..SignalRules::default()
        };
        let yesterday = row(1, 104.0, 22.0, 26.0, 35.0, -0.5);
        let today = row(2, 105.0, 28.0, 25.0, 40.0, -0.2);
        assert_eq!(classify(&today, &yesterday, &rules).unwrap().kind, SignalKind::Buy);
        assert_eq!(
            classify(&today, &yesterday, &SignalRules::default()).unwrap().kind,
            SignalKind::None
        );
    }

    #[test]
    fn undefined_indicator_fails_closed() {
        let yesterday = row(1, 104.0, 15.0, 18.0, 35.0, -0.5);
        let mut today = row(2, 105.0, 19.0, 17.0, 40.0, -0.2);
        today.macd_hist = None;

        let err = classify(&today, &yesterday, &SignalRules::default()).unwrap_err();
        assert_eq!(
            err,
            SignalError::UndefinedIndicator {
                date: today.date,
                field: "macd_hist"
            }
        );
    }

    #[test]
    fn undefined_yesterday_also_fails() {
        let mut yesterday = row(1, 104.0, 15.0, 18.0, 35.0, -0.5);
        yesterday.stoch_d = None;
        let today = row(2, 105.0, 19.0, 17.0, 40.0, -0.2);

        let err = classify(&today, &yesterday, &SignalRules::default()).unwrap_err();
        assert!(matches!(
            err,
            SignalError::UndefinedIndicator { field: "stoch_d", .. }
        ));
    }

    #[test]
    fn classify_latest_needs_two_rows() {
        let frame = IndicatorFrame::from_rows(
            IndicatorParams::default(),
            vec![row(1, 104.0, 15.0, 18.0, 35.0, -0.5)],
        );
        let err = classify_latest(&frame, &SignalRules::default()).unwrap_err();
        assert_eq!(
            err,
            SignalError::InsufficientData {
                rows: 1,
                required: 2
            }
        );
    }

    #[test]
    fn classify_latest_uses_final_pair() {
        let frame = IndicatorFrame::from_rows(
            IndicatorParams::default(),
            vec![
                row(1, 110.0, 50.0, 50.0, 50.0, 0.0),
                row(2, 110.0, 88.0, 85.0, 45.0, 0.4),
                row(3, 109.0, 82.0, 84.0, 40.0, 0.3),
            ],
        );
        let signal = classify_latest(&frame, &SignalRules::default()).unwrap();
        assert_eq!(signal.kind, SignalKind::Sell);
        assert_eq!(signal.evidence.date, NaiveDate::from_ymd_opt(2024, 5, 3).unwrap());
    }

    #[test]
    fn kind_labels() {
        assert_eq!(SignalKind::Buy.to_string(), "BUY");
        assert_eq!(SignalKind::Hold.to_string(), "HOLD");
        assert!(SignalKind::Sell.is_actionable());
        assert!(!SignalKind::None.is_actionable());
    }

    proptest! {
        #[test]
        fn crosses_are_mutually_exclusive(
            k0 in 0.0f64..100.0, d0 in 0.0f64..100.0,
            k1 in 0.0f64..100.0, d1 in 0.0f64..100.0,
        ) {
            let yesterday = row(1, 100.0, k0, d0, 50.0, 0.0);
            let today = row(2, 100.0, k1, d1, 50.0, 0.0);
            let preds = Predicates::evaluate(&today, &yesterday, &SignalRules::default()).unwrap();
            prop_assert!(!(preds.gold_cross && preds.dead_cross));
        }

        #[test]
        fn swapping_k_and_d_mirrors_the_cross(
            k0 in 0.0f64..100.0, d0 in 0.0f64..100.0,
            k1 in 0.0f64..100.0, d1 in 0.0f64..100.0,
        ) {
            let rules = SignalRules::default();
            let preds = Predicates::evaluate(
                &row(2, 100.0, k1, d1, 50.0, 0.0),
                &row(1, 100.0, k0, d0, 50.0, 0.0),
                &rules,
            ).unwrap();
            let mirrored = Predicates::evaluate(
                &row(2, 100.0, d1, k1, 50.0, 0.0),
                &row(1, 100.0, d0, k0, 50.0, 0.0),
                &rules,
            ).unwrap();
            prop_assert_eq!(preds.gold_cross, mirrored.dead_cross);
            prop_assert_eq!(preds.dead_cross, mirrored.gold_cross);
        }

        #[test]
        fn buy_and_sell_never_coincide(
            k0 in 0.0f64..100.0, d0 in 0.0f64..100.0,
            k1 in 0.0f64..100.0, d1 in 0.0f64..100.0,
            rsi in 0.0f64..100.0,
        ) {
            let preds = Predicates::evaluate(
                &row(2, 105.0, k1, d1, rsi, 0.2),
                &row(1, 105.0, k0, d0, rsi, 0.1),
                &SignalRules::default(),
            ).unwrap();
            let kind = preds.kind();
            if preds.oversold {
                prop_assert_ne!(kind, SignalKind::Sell);
                prop_assert_ne!(kind, SignalKind::Hold);
            }
        }
    }
}
