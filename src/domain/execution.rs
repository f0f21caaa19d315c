//! Fill simulation for the all-in long strategy.
//!
//! Entries buy as many whole shares as cash allows at the day's close; exits
//! sell the entire holding at the close. No fees or slippage.

use chrono::NaiveDate;

use super::portfolio::Portfolio;
use super::position::{ClosedTrade, Position};

/// Result of an entry attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryResult {
    Entered { shares: u64, cost: f64 },
    AlreadyLong,
    InsufficientCapital,
    InvalidPrice,
}

/// Result of an exit attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum ExitResult {
    Exited(ClosedTrade),
    NotLong,
}

/// Whole shares affordable with `cash` at `price`.
pub fn shares_affordable(cash: f64, price: f64) -> u64 {
    if !(price.is_finite() && price > 0.0) || !(cash.is_finite() && cash > 0.0) {
        return 0;
    }
    (cash / price).floor() as u64
}

/// Enter a long position with all available cash.
///
/// 1. Reject if already long or the price is unusable
/// 2. shares = floor(cash / price); zero shares leaves the portfolio flat
/// 3. Deduct cost from cash and open the position
pub fn enter_long(portfolio: &mut Portfolio, price: f64, date: NaiveDate) -> EntryResult {
    if portfolio.is_long() {
        return EntryResult::AlreadyLong;
    }
    if !(price.is_finite() && price > 0.0) {
        return EntryResult::InvalidPrice;
    }

    let shares = shares_affordable(portfolio.cash, price);
    if shares == 0 {
        return EntryResult::InsufficientCapital;
    }

    let cost = shares as f64 * price;
    if cost > portfolio.cash {
        return EntryResult::InsufficientCapital;
    }

    portfolio.cash -= cost;
    portfolio.position = Some(Position {
        shares,
        entry_price: price,
        entry_date: date,
    });

    EntryResult::Entered { shares, cost }
}

/// Sell the whole holding at `price` and record the trade.
pub fn exit_long(portfolio: &mut Portfolio, price: f64, date: NaiveDate) -> ExitResult {
    let Some(position) = portfolio.position.take() else {
        return ExitResult::NotLong;
    };

    portfolio.cash += position.market_value(price);
    let trade = position.close(date, price);
    portfolio.record_trade(trade.clone());

    ExitResult::Exited(trade)
}
