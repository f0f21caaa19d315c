#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use kdtrader::domain::backtest::BacktestConfig;
use kdtrader::domain::error::KdtraderError;
use kdtrader::domain::frame::IndicatorRow;
use kdtrader::domain::notification::{Fundamentals, Notification, Subscription};
pub use kdtrader::domain::ohlcv::PriceBar;
use kdtrader::ports::data_port::DataPort;
use kdtrader::ports::fundamentals_port::FundamentalsPort;
use kdtrader::ports::notification_port::NotificationPort;
use kdtrader::ports::subscriber_port::SubscriberPort;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(
        &self,
        symbol: &str,
        _start_date: NaiveDate,
        _end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, KdtraderError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(KdtraderError::Provider {
                reason: reason.clone(),
            });
        }
        Ok(self.data.get(symbol).cloned().unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, KdtraderError> {
        Ok(self.data.keys().cloned().collect())
    }
}

pub struct MockSubscribers {
    pub subscriptions: Vec<Subscription>,
    pub error: Option<String>,
}

impl MockSubscribers {
    pub fn new(pairs: &[(&str, &str)]) -> Self {
        Self {
            subscriptions: pairs
                .iter()
                .map(|(recipient, symbol)| Subscription {
                    symbol: symbol.to_string(),
                    recipient: recipient.to_string(),
                })
                .collect(),
            error: None,
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            subscriptions: Vec::new(),
            error: Some(reason.to_string()),
        }
    }
}

impl SubscriberPort for MockSubscribers {
    fn subscriptions(&self) -> Result<Vec<Subscription>, KdtraderError> {
        match &self.error {
            Some(reason) => Err(KdtraderError::Subscribers {
                reason: reason.clone(),
            }),
            None => Ok(self.subscriptions.clone()),
        }
    }
}

pub struct MockFundamentals {
    pub data: HashMap<String, Fundamentals>,
    pub failing: bool,
    pub lookups: RefCell<Vec<String>>,
}

impl MockFundamentals {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            failing: false,
            lookups: RefCell::new(Vec::new()),
        }
    }

    pub fn with(mut self, symbol: &str, fundamentals: Fundamentals) -> Self {
        self.data.insert(symbol.to_string(), fundamentals);
        self
    }
}

impl FundamentalsPort for MockFundamentals {
    fn fundamentals(&self, symbol: &str) -> Result<Option<Fundamentals>, KdtraderError> {
        self.lookups.borrow_mut().push(symbol.to_string());
        if self.failing {
            return Err(KdtraderError::Provider {
                reason: "fundamentals service down".into(),
            });
        }
        Ok(self.data.get(symbol).copied())
    }
}

/// Records deliveries; recipients in `reject` fail.
pub struct RecordingNotifier {
    pub sent: RefCell<Vec<(String, Notification)>>,
    pub reject: HashSet<String>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            sent: RefCell::new(Vec::new()),
            reject: HashSet::new(),
        }
    }

    pub fn rejecting(recipients: &[&str]) -> Self {
        Self {
            sent: RefCell::new(Vec::new()),
            reject: recipients.iter().map(|r| r.to_string()).collect(),
        }
    }

    pub fn recipients(&self) -> Vec<String> {
        self.sent.borrow().iter().map(|(r, _)| r.clone()).collect()
    }
}

impl NotificationPort for RecordingNotifier {
    fn deliver(&self, recipient: &str, notification: &Notification) -> Result<(), KdtraderError> {
        if self.reject.contains(recipient) {
            return Err(KdtraderError::Notification {
                reason: format!("{} unreachable", recipient),
            });
        }
        self.sent
            .borrow_mut()
            .push((recipient.to_string(), notification.clone()));
        Ok(())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Daily bars from 2024-01-01 with a two-point high/low band around close.
pub fn bars_from_closes(closes: &[f64]) -> Vec<PriceBar> {
    let start = date(2024, 1, 1);
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceBar {
            date: start + Duration::days(i as i64),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1000,
        })
        .collect()
}

/// 70-day climb of 0.5/day from 100, five 3-point drops, then a 4-point
/// rebound. The rebound (123.5 on 2024-03-16) is a BUY under default rules.
pub fn buy_closes() -> Vec<f64> {
    let mut closes = vec![100.0];
    for _ in 0..69 {
        closes.push(closes[closes.len() - 1] + 0.5);
    }
    for _ in 0..5 {
        closes.push(closes[closes.len() - 1] - 3.0);
    }
    closes.push(closes[closes.len() - 1] + 4.0);
    closes
}

/// Alternating up/down steps from 100, followed by `tail` moves.
pub fn zigzag_closes(steps: usize, up: f64, down: f64, tail: &[f64]) -> Vec<f64> {
    let mut closes = vec![100.0];
    for i in 0..steps {
        let delta = if i % 2 == 0 { up } else { -down };
        closes.push(closes[closes.len() - 1] + delta);
    }
    for delta in tail {
        closes.push(closes[closes.len() - 1] + delta);
    }
    closes
}

/// Ends in an overbought dead cross with RSI near 66: SELL at 137.0.
pub fn sell_closes() -> Vec<f64> {
    zigzag_closes(69, 2.0, 1.0, &[3.0, -2.0])
}

/// Ends in an overbought dead cross with RSI near 76: HOLD at 154.0.
pub fn hold_closes() -> Vec<f64> {
    zigzag_closes(69, 2.0, 0.5, &[3.0, -2.0])
}

/// The BUY series followed by a choppy rally that ends in a SELL at 132.0
/// on 2024-03-28.
pub fn round_trip_closes() -> Vec<f64> {
    let mut closes = buy_closes();
    for i in 0..10 {
        let delta = if i % 2 == 0 { 2.0 } else { -0.5 };
        closes.push(closes[closes.len() - 1] + delta);
    }
    closes.push(closes[closes.len() - 1] + 3.0);
    closes.push(closes[closes.len() - 1] - 2.0);
    closes
}

/// Index bars moving `step` points a day from 17000.
pub fn index_bars(n: usize, step: f64) -> Vec<PriceBar> {
    let closes: Vec<f64> = (0..n).map(|i| 17_000.0 + step * i as f64).collect();
    bars_from_closes(&closes)
}

pub fn row(day: i64, close: f64, k: f64, d: f64, rsi: f64, hist: f64) -> IndicatorRow {
    IndicatorRow {
        date: date(2024, 5, 1) + Duration::days(day),
        close,
        volume: 3000,
        stoch_k: Some(k),
        stoch_d: Some(d),
        trend_sma: Some(100.0),
        rsi: Some(rsi),
        macd_hist: Some(hist),
        volume_sma: Some(1500.0),
    }
}

pub fn sample_config() -> BacktestConfig {
    BacktestConfig {
        initial_capital: 100_000.0,
        start_date: date(2024, 1, 1),
        end_date: date(2024, 12, 31),
    }
}
