//! Open position and closed trade records.

use chrono::NaiveDate;

/// A long holding. Only exists while the simulator is Long.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub shares: u64,
    pub entry_price: f64,
    pub entry_date: NaiveDate,
}

impl Position {
    pub fn market_value(&self, price: f64) -> f64 {
        self.shares as f64 * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.shares as f64 * (price - self.entry_price)
    }

    /// Close the position at `exit_price`, producing the trade record.
    pub fn close(self, exit_date: NaiveDate, exit_price: f64) -> ClosedTrade {
        let pnl = self.unrealized_pnl(exit_price);
        ClosedTrade {
            shares: self.shares,
            entry_date: self.entry_date,
            entry_price: self.entry_price,
            exit_date,
            exit_price,
            pnl,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClosedTrade {
    pub shares: u64,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub exit_date: NaiveDate,
    pub exit_price: f64,
    pub pnl: f64,
}

impl ClosedTrade {
    pub fn is_win(&self) -> bool {
        self.pnl > 0.0
    }

    pub fn holding_days(&self) -> i64 {
        (self.exit_date - self.entry_date).num_days()
    }
}
