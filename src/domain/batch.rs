//! Independent evaluation of many instruments.
//!
//! Bars are fetched sequentially through the data port, then every instrument
//! is evaluated on the rayon pool. Each instrument owns its own frame, cash
//! and position, so evaluations share nothing but read-only bars. A failure
//! stays inside that instrument's outcome; the batch always completes.

use chrono::NaiveDate;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::domain::backtest::{run_backtest, BacktestConfig, BacktestResult};
use crate::domain::error::KdtraderError;
use crate::domain::frame::{IndicatorFrame, IndicatorParams};
use crate::domain::ohlcv::{is_chronological, PriceBar};
use crate::domain::signal::{classify_latest, Signal, SignalRules};
use crate::ports::data_port::DataPort;

#[derive(Debug)]
pub struct InstrumentOutcome<T> {
    pub symbol: String,
    pub result: Result<T, KdtraderError>,
}

impl<T> InstrumentOutcome<T> {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

pub type FetchedBars = (String, Result<Vec<PriceBar>, KdtraderError>);

/// Fetch bars for each symbol in order. An empty history becomes `NoData`,
/// bars out of date order a provider error.
pub fn fetch_all(
    data_port: &dyn DataPort,
    symbols: &[String],
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Vec<FetchedBars> {
    symbols
        .iter()
        .map(|symbol| {
            let bars = data_port
                .fetch_bars(symbol, start_date, end_date)
                .and_then(|bars| {
                    if bars.is_empty() {
                        Err(KdtraderError::NoData {
                            symbol: symbol.clone(),
                        })
                    } else if !is_chronological(&bars) {
                        Err(KdtraderError::Provider {
                            reason: format!("{}: bars not in ascending date order", symbol),
                        })
                    } else {
                        Ok(bars)
                    }
                });
            if let Ok(bars) = &bars {
                debug!(symbol = %symbol, bars = bars.len(), "fetched");
            }
            (symbol.clone(), bars)
        })
        .collect()
}

/// Evaluate every instrument in parallel. Outcomes keep input order.
pub fn run_batch<T, F>(inputs: Vec<FetchedBars>, evaluate: F) -> Vec<InstrumentOutcome<T>>
where
    T: Send,
    F: Fn(&str, &[PriceBar]) -> Result<T, KdtraderError> + Sync,
{
    inputs
        .into_par_iter()
        .map(|(symbol, bars)| {
            let result = bars.and_then(|bars| evaluate(&symbol, &bars));
            if let Err(e) = &result {
                warn!(symbol = %symbol, error = %e, "instrument failed");
            }
            InstrumentOutcome { symbol, result }
        })
        .collect()
}

pub fn backtest_instrument(
    symbol: &str,
    bars: &[PriceBar],
    params: IndicatorParams,
    rules: &SignalRules,
    config: &BacktestConfig,
) -> Result<BacktestResult, KdtraderError> {
    let frame = IndicatorFrame::compute(bars, params);
    run_backtest(symbol, &frame, rules, config)
}

/// Latest signal for one instrument. Fewer bars than the indicators need is
/// reported as `InsufficientHistory` rather than an undefined-indicator error.
pub fn signal_for_instrument(
    symbol: &str,
    bars: &[PriceBar],
    params: IndicatorParams,
    rules: &SignalRules,
) -> Result<Signal, KdtraderError> {
    let minimum = params.min_bars_for_signal();
    if bars.len() < minimum {
        return Err(KdtraderError::InsufficientHistory {
            symbol: symbol.to_string(),
            bars: bars.len(),
            minimum,
        });
    }
    let frame = IndicatorFrame::compute(bars, params);
    Ok(classify_latest(&frame, rules)?)
}
