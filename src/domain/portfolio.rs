//! Single-instrument account state and equity tracking.

use chrono::NaiveDate;

use super::position::{ClosedTrade, Position};

/// Account snapshot at the close of one simulated day.
#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub cash: f64,
    pub shares: u64,
    pub close: f64,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub cash: f64,
    pub initial_capital: f64,
    pub position: Option<Position>,
    pub closed_trades: Vec<ClosedTrade>,
    pub equity_curve: Vec<EquityPoint>,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Portfolio {
            cash: initial_capital,
            initial_capital,
            position: None,
            closed_trades: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    pub fn is_long(&self) -> bool {
        self.position.is_some()
    }

    pub fn shares(&self) -> u64 {
        self.position.as_ref().map_or(0, |p| p.shares)
    }

    /// cash + shares * price
    pub fn equity(&self, price: f64) -> f64 {
        self.cash
            + self
                .position
                .as_ref()
                .map_or(0.0, |p| p.market_value(price))
    }

    pub fn record_trade(&mut self, trade: ClosedTrade) {
        self.closed_trades.push(trade);
    }

    pub fn record_equity(&mut self, date: NaiveDate, close: f64) {
        let point = EquityPoint {
            date,
            cash: self.cash,
            shares: self.shares(),
            close,
            equity: self.equity(close),
        };
        self.equity_curve.push(point);
    }
}
