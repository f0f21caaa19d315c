//! Live scan: trend gate, per-symbol signals and subscriber fan-out.
//!
//! 1. Read the market trend from the index (optional)
//! 2. Load subscriptions and normalize their symbols
//! 3. Compute the latest signal for each distinct symbol
//! 4. Drop BUY signals while the market is in a confirmed downtrend
//! 5. Attach fundamentals to what is left (optional)
//! 6. Deliver one notification per subscriber of each signalled symbol
//!
//! Only a failing subscriber store aborts the scan. Index, price,
//! fundamentals and delivery failures are logged and absorbed.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate};
use std::collections::HashMap;
use tracing::{info, warn};

use crate::domain::batch::{fetch_all, run_batch, signal_for_instrument, InstrumentOutcome};
use crate::domain::error::KdtraderError;
use crate::domain::frame::IndicatorParams;
use crate::domain::market_trend::{evaluate_trend, DegradedReason, TrendReading, DEFAULT_INDEX_PERIOD};
use crate::domain::notification::{Fundamentals, Notification, Subscription};
use crate::domain::signal::{Signal, SignalKind, SignalRules};
use crate::domain::universe::{normalize_symbol, unique_symbols, DEFAULT_SUFFIX};
use crate::ports::data_port::DataPort;
use crate::ports::fundamentals_port::FundamentalsPort;
use crate::ports::notification_port::NotificationPort;
use crate::ports::subscriber_port::SubscriberPort;

pub const DEFAULT_INDEX_SYMBOL: &str = "^TWII";

#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    pub trend_filter: bool,
    pub index_symbol: String,
    pub index_period: usize,
    /// Calendar days of index history to request.
    pub index_lookback_days: i64,
    /// Calendar days of price history to request per symbol.
    pub lookback_days: i64,
    pub fundamentals: bool,
    pub default_suffix: String,
    pub params: IndicatorParams,
    pub rules: SignalRules,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            trend_filter: true,
            index_symbol: DEFAULT_INDEX_SYMBOL.to_string(),
            index_period: DEFAULT_INDEX_PERIOD,
            index_lookback_days: 61,
            lookback_days: 183,
            fundamentals: true,
            default_suffix: DEFAULT_SUFFIX.to_string(),
            params: IndicatorParams::default(),
            rules: SignalRules::default(),
        }
    }
}

pub struct ScanPorts<'a> {
    pub data: &'a dyn DataPort,
    pub subscribers: &'a dyn SubscriberPort,
    pub fundamentals: Option<&'a dyn FundamentalsPort>,
    pub notifier: &'a dyn NotificationPort,
}

#[derive(Debug, Default)]
pub struct ScanReport {
    /// `None` when the trend filter is disabled.
    pub trend: Option<TrendReading>,
    pub outcomes: Vec<InstrumentOutcome<Signal>>,
    /// Notifications built for actionable, unblocked signals.
    pub alerts: Vec<Notification>,
    /// BUY signals suppressed by a confirmed downtrend.
    pub blocked: usize,
    pub delivered: usize,
    pub failed: usize,
}

impl ScanReport {
    pub fn errors(&self) -> impl Iterator<Item = (&str, &KdtraderError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.symbol.as_str(), e)))
    }
}

pub fn run_scan(
    ports: &ScanPorts<'_>,
    config: &ScanConfig,
    now: DateTime<FixedOffset>,
) -> Result<ScanReport, KdtraderError> {
    let today = now.date_naive();
    let mut report = ScanReport::default();

    if config.trend_filter {
        let reading = read_trend(ports.data, config, today);
        if reading.is_degraded() {
            warn!(rationale = %reading.rationale(), "market trend degraded");
        } else {
            info!(regime = %reading.regime(), rationale = %reading.rationale(), "market trend");
        }
        report.trend = Some(reading);
    }

    let subscriptions = normalized_subscriptions(ports.subscribers.subscriptions()?, config);
    if subscriptions.is_empty() {
        info!("no subscribers");
        return Ok(report);
    }

    let symbols = unique_symbols(subscriptions.iter().map(|s| s.symbol.as_str()));
    info!(count = symbols.len(), "scanning symbols");

    let start = days_before(today, config.lookback_days);
    let fetched = fetch_all(ports.data, &symbols, start, today);
    let params = config.params;
    let rules = config.rules;
    report.outcomes = run_batch(fetched, |symbol, bars| {
        signal_for_instrument(symbol, bars, params, &rules)
    });

    let mut by_symbol: HashMap<&str, Vec<&Subscription>> = HashMap::new();
    for sub in &subscriptions {
        by_symbol.entry(sub.symbol.as_str()).or_default().push(sub);
    }

    for outcome in &report.outcomes {
        let Ok(signal) = &outcome.result else {
            continue;
        };
        if !signal.kind.is_actionable() {
            continue;
        }

        if signal.kind == SignalKind::Buy
            && let Some(trend) = &report.trend
        {
            if !trend.permits_buy() {
                info!(symbol = %outcome.symbol, rationale = %trend.rationale(), "buy blocked by market filter");
                report.blocked += 1;
                continue;
            }
            if trend.is_degraded() {
                warn!(symbol = %outcome.symbol, "buy allowed while market trend is undetermined");
            }
        }

        info!(symbol = %outcome.symbol, signal = %signal.kind, price = signal.evidence.price, "signal detected");

        let fundamentals = if config.fundamentals {
            ports
                .fundamentals
                .and_then(|port| lookup_fundamentals(port, &outcome.symbol))
        } else {
            None
        };

        let notification = Notification {
            symbol: outcome.symbol.clone(),
            signal: signal.clone(),
            fundamentals,
            timestamp: now,
        };

        for sub in by_symbol.get(outcome.symbol.as_str()).into_iter().flatten() {
            match ports.notifier.deliver(&sub.recipient, &notification) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!(symbol = %outcome.symbol, recipient = %sub.recipient, error = %e, "delivery failed");
                    report.failed += 1;
                }
            }
        }
        report.alerts.push(notification);
    }

    if report.alerts.is_empty() {
        info!("no signals today");
    }

    Ok(report)
}

fn read_trend(data: &dyn DataPort, config: &ScanConfig, today: NaiveDate) -> TrendReading {
    let start = days_before(today, config.index_lookback_days);
    match data.fetch_bars(&config.index_symbol, start, today) {
        Ok(bars) => evaluate_trend(&bars, config.index_period),
        Err(e) => TrendReading::Degraded(DegradedReason::ProviderFailure(e.to_string())),
    }
}

fn normalized_subscriptions(raw: Vec<Subscription>, config: &ScanConfig) -> Vec<Subscription> {
    raw.into_iter()
        .filter(|s| !s.symbol.trim().is_empty() && !s.recipient.trim().is_empty())
        .map(|s| Subscription {
            symbol: normalize_symbol(&s.symbol, &config.default_suffix),
            recipient: s.recipient.trim().to_string(),
        })
        .collect()
}

fn lookup_fundamentals(port: &dyn FundamentalsPort, symbol: &str) -> Option<Fundamentals> {
    match port.fundamentals(symbol) {
        Ok(found) => found,
        Err(e) => {
            warn!(symbol, error = %e, "fundamentals unavailable");
            None
        }
    }
}

fn days_before(date: NaiveDate, days: i64) -> NaiveDate {
    date.checked_sub_signed(Duration::days(days.max(0)))
        .unwrap_or(NaiveDate::MIN)
}
