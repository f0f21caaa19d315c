//! Single-instrument backtest engine.
//!
//! Replays every complete row of an indicator frame, classifying each day
//! against the previous complete row and acting on the signal with a
//! Flat/Long state machine:
//!
//! - Flat + BUY: buy floor(cash / close) shares, stay Flat if that is zero
//! - Long + SELL: sell everything at the close and record the trade
//! - anything else: no transition
//!
//! Equity is recorded for every replayed day.

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::domain::error::KdtraderError;
use crate::domain::execution::{enter_long, exit_long, EntryResult, ExitResult};
use crate::domain::frame::IndicatorFrame;
use crate::domain::metrics::BacktestSummary;
use crate::domain::portfolio::Portfolio;
use crate::domain::signal::{classify, SignalKind, SignalRules};

pub const DEFAULT_INITIAL_CAPITAL: f64 = 100_000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// An actionable signal observed during the replay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalEvent {
    pub date: NaiveDate,
    pub kind: SignalKind,
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub symbol: String,
    pub portfolio: Portfolio,
    pub summary: BacktestSummary,
    pub signals: Vec<SignalEvent>,
}

pub fn run_backtest(
    symbol: &str,
    frame: &IndicatorFrame,
    rules: &SignalRules,
    config: &BacktestConfig,
) -> Result<BacktestResult, KdtraderError> {
    let rows = frame.complete_rows();
    let (Some(first), Some(last)) = (rows.first(), rows.last()) else {
        return Err(insufficient(symbol, frame));
    };
    if rows.len() < 2 {
        return Err(insufficient(symbol, frame));
    }

    let mut portfolio = Portfolio::new(config.initial_capital);
    let mut signals = Vec::new();
    portfolio.record_equity(first.date, first.close);

    for pair in rows.windows(2) {
        let (yesterday, today) = (pair[0], pair[1]);
        let signal = classify(today, yesterday, rules)?;

        match signal.kind {
            SignalKind::Buy => match enter_long(&mut portfolio, today.close, today.date) {
                EntryResult::Entered { shares, cost } => {
                    info!(symbol, date = %today.date, shares, price = today.close, cost, "buy");
                }
                EntryResult::InsufficientCapital => {
                    debug!(symbol, date = %today.date, price = today.close, "buy skipped: cash below one share");
                }
                EntryResult::AlreadyLong | EntryResult::InvalidPrice => {}
            },
            SignalKind::Sell => {
                if let ExitResult::Exited(trade) = exit_long(&mut portfolio, today.close, today.date)
                {
                    info!(symbol, date = %today.date, shares = trade.shares, price = trade.exit_price, pnl = trade.pnl, "sell");
                }
            }
            SignalKind::Hold => {
                debug!(symbol, date = %today.date, rsi = signal.evidence.rsi, "sell held back by passivated RSI");
            }
            SignalKind::None => {}
        }

        if signal.kind.is_actionable() {
            signals.push(SignalEvent {
                date: today.date,
                kind: signal.kind,
            });
        }
        portfolio.record_equity(today.date, today.close);
    }

    let summary = BacktestSummary::compute(&portfolio, last.close);
    info!(
        symbol,
        trades = summary.trade_count,
        roi = summary.roi,
        final_value = summary.final_value,
        "backtest complete"
    );

    Ok(BacktestResult {
        symbol: symbol.to_string(),
        portfolio,
        summary,
        signals,
    })
}

fn insufficient(symbol: &str, frame: &IndicatorFrame) -> KdtraderError {
    KdtraderError::InsufficientHistory {
        symbol: symbol.to_string(),
        bars: frame.len(),
        minimum: frame.params.min_bars_for_signal(),
    }
}
