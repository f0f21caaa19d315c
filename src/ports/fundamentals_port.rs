//! Fundamentals lookup port trait.

use crate::domain::error::KdtraderError;
use crate::domain::notification::Fundamentals;

pub trait FundamentalsPort {
    /// `Ok(None)` when the source has nothing for `symbol`.
    fn fundamentals(&self, symbol: &str) -> Result<Option<Fundamentals>, KdtraderError>;
}
