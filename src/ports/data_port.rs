//! Price history port trait.

use crate::domain::error::KdtraderError;
use crate::domain::ohlcv::PriceBar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Daily bars for `symbol` within `[start_date, end_date]`, oldest first.
    /// An unknown symbol yields an empty vector, a broken source an error.
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, KdtraderError>;

    fn list_symbols(&self) -> Result<Vec<String>, KdtraderError>;
}
