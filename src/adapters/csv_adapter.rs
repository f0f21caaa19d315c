//! CSV file price data adapter.
//!
//! One file per symbol at `<dir>/<symbol>.csv` with a header row naming
//! `date,open,high,low,close,volume` (any order, case-insensitive).

use crate::domain::error::KdtraderError;
use crate::domain::ohlcv::PriceBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use csv::StringRecord;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }
}

fn provider(reason: String) -> KdtraderError {
    KdtraderError::Provider { reason }
}

/// Position of `name` in the header row, ignoring case and whitespace.
pub(crate) fn header_index(headers: &StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
}

pub(crate) fn require_header(
    headers: &StringRecord,
    name: &str,
    path: &Path,
) -> Result<usize, KdtraderError> {
    header_index(headers, name)
        .ok_or_else(|| provider(format!("{}: missing {} column", path.display(), name)))
}

struct Columns {
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: usize,
}

fn parse_f64(record: &StringRecord, index: usize, name: &str, line: u64) -> Result<f64, KdtraderError> {
    let raw = record.get(index).unwrap_or("").trim();
    raw.parse::<f64>()
        .map_err(|e| provider(format!("line {}: invalid {} value {:?}: {}", line, name, raw, e)))
}

fn parse_bar(record: &StringRecord, cols: &Columns) -> Result<PriceBar, KdtraderError> {
    let line = record.position().map_or(0, |p| p.line());
    let date_str = record.get(cols.date).unwrap_or("").trim();
    let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .map_err(|e| provider(format!("line {}: invalid date {:?}: {}", line, date_str, e)))?;

    Ok(PriceBar {
        date,
        open: parse_f64(record, cols.open, "open", line)?,
        high: parse_f64(record, cols.high, "high", line)?,
        low: parse_f64(record, cols.low, "low", line)?,
        close: parse_f64(record, cols.close, "close", line)?,
        // some exporters write volume as a float
        volume: parse_f64(record, cols.volume, "volume", line)?.round() as i64,
    })
}

impl DataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, KdtraderError> {
        let path = self.csv_path(symbol);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(provider(format!("failed to read {}: {}", path.display(), e))),
        };

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| provider(format!("{}: {}", path.display(), e)))?
            .clone();
        let cols = Columns {
            date: require_header(&headers, "date", &path)?,
            open: require_header(&headers, "open", &path)?,
            high: require_header(&headers, "high", &path)?,
            low: require_header(&headers, "low", &path)?,
            close: require_header(&headers, "close", &path)?,
            volume: require_header(&headers, "volume", &path)?,
        };

        let mut bars = Vec::new();
        for result in rdr.records() {
            let record =
                result.map_err(|e| provider(format!("{}: CSV parse error: {}", path.display(), e)))?;
            let bar = parse_bar(&record, &cols)?;
            if bar.date >= start_date && bar.date <= end_date {
                bars.push(bar);
            }
        }

        bars.sort_by_key(|b| b.date);
        bars.dedup_by_key(|b| b.date);
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, KdtraderError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| {
            provider(format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ))
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| provider(format!("directory entry error: {}", e)))?;
            let name = entry.file_name();
            if let Some(symbol) = name.to_string_lossy().strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
