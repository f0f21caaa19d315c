//! Subscriber list read from a CSV export.
//!
//! Expects a header row with a recipient column (`user_id` or `userId`) and
//! a `ticker` column. Rows missing either value are skipped.

use crate::adapters::csv_adapter::header_index;
use crate::domain::error::KdtraderError;
use crate::domain::notification::Subscription;
use crate::ports::subscriber_port::SubscriberPort;
use std::fs;
use std::path::PathBuf;

pub struct CsvSubscriberAdapter {
    path: PathBuf,
}

impl CsvSubscriberAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

fn store_error(reason: String) -> KdtraderError {
    KdtraderError::Subscribers { reason }
}

impl SubscriberPort for CsvSubscriberAdapter {
    fn subscriptions(&self) -> Result<Vec<Subscription>, KdtraderError> {
        let content = fs::read_to_string(&self.path)
            .map_err(|e| store_error(format!("failed to read {}: {}", self.path.display(), e)))?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| store_error(format!("{}: {}", self.path.display(), e)))?
            .clone();

        let recipient_col = header_index(&headers, "user_id")
            .or_else(|| header_index(&headers, "userid"))
            .ok_or_else(|| store_error(format!("{}: missing user_id column", self.path.display())))?;
        let ticker_col = header_index(&headers, "ticker")
            .ok_or_else(|| store_error(format!("{}: missing ticker column", self.path.display())))?;

        let mut subscriptions = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| store_error(format!("CSV parse error: {}", e)))?;
            let recipient = record.get(recipient_col).unwrap_or("").trim();
            let symbol = record.get(ticker_col).unwrap_or("").trim();
            if recipient.is_empty() || symbol.is_empty() {
                continue;
            }
            subscriptions.push(Subscription {
                symbol: symbol.to_string(),
                recipient: recipient.to_string(),
            });
        }

        Ok(subscriptions)
    }
}
