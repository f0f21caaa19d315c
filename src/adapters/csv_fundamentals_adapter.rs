//! Fundamentals table read from a CSV file.
//!
//! Columns: `symbol,pe,eps,dividend_yield`. A blank or non-numeric cell is a
//! missing figure. Symbols are normalized with the market suffix so `2330`
//! and `2330.TW` rows both answer lookups for `2330.TW`. The file is loaded
//! once at construction.

use crate::adapters::csv_adapter::header_index;
use crate::domain::error::KdtraderError;
use crate::domain::notification::Fundamentals;
use crate::domain::universe::normalize_symbol;
use crate::ports::fundamentals_port::FundamentalsPort;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub struct CsvFundamentalsAdapter {
    table: HashMap<String, Fundamentals>,
}

fn provider(reason: String) -> KdtraderError {
    KdtraderError::Provider { reason }
}

impl CsvFundamentalsAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P, suffix: &str) -> Result<Self, KdtraderError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| provider(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_csv(&content, suffix)
    }

    pub fn from_csv(content: &str, suffix: &str) -> Result<Self, KdtraderError> {
        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| provider(format!("fundamentals: {}", e)))?
            .clone();
        let symbol_col = header_index(&headers, "symbol")
            .ok_or_else(|| provider("fundamentals: missing symbol column".to_string()))?;
        let pe_col = header_index(&headers, "pe");
        let eps_col = header_index(&headers, "eps");
        let yield_col = header_index(&headers, "dividend_yield");

        let mut table = HashMap::new();
        for result in rdr.records() {
            let record = result.map_err(|e| provider(format!("fundamentals: {}", e)))?;
            let cell = |col: Option<usize>| {
                col.and_then(|i| record.get(i))
                    .and_then(|v| v.trim().parse::<f64>().ok())
                    .filter(|v| v.is_finite())
            };
            let symbol = normalize_symbol(record.get(symbol_col).unwrap_or(""), suffix);
            if symbol.is_empty() {
                continue;
            }
            table.insert(
                symbol,
                Fundamentals {
                    pe: cell(pe_col),
                    eps: cell(eps_col),
                    dividend_yield: cell(yield_col),
                },
            );
        }

        Ok(Self { table })
    }
}

impl FundamentalsPort for CsvFundamentalsAdapter {
    fn fundamentals(&self, symbol: &str) -> Result<Option<Fundamentals>, KdtraderError> {
        Ok(self.table.get(symbol.trim().to_uppercase().as_str()).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_figures_and_blanks() {
        let adapter = CsvFundamentalsAdapter::from_csv(
            "symbol,pe,eps,dividend_yield\n2330.TW,25.3,39.2,1.6\n2603.TW,,n/a,7.5\n",
            ".TW",
        )
        .unwrap();

        let tsmc = adapter.fundamentals("2330.tw").unwrap().unwrap();
        assert_eq!(tsmc.pe, Some(25.3));
        assert_eq!(tsmc.eps, Some(39.2));
        assert_eq!(tsmc.dividend_yield, Some(1.6));

        let evergreen = adapter.fundamentals("2603.TW").unwrap().unwrap();
        assert_eq!(evergreen.pe, None);
        assert_eq!(evergreen.eps, None);
        assert_eq!(evergreen.dividend_yield, Some(7.5));
    }

    #[test]
    fn unknown_symbol_is_none() {
        let adapter = CsvFundamentalsAdapter::from_csv("symbol,pe\n2330.TW,20\n", ".TW").unwrap();
        assert_eq!(adapter.fundamentals("9999.TW").unwrap(), None);
    }

    #[test]
    fn optional_columns_may_be_absent() {
        let adapter = CsvFundamentalsAdapter::from_csv("symbol,eps\n2330.TW,10\n", ".TW").unwrap();
        let f = adapter.fundamentals("2330.TW").unwrap().unwrap();
        assert_eq!(f.pe, None);
        assert_eq!(f.eps, Some(10.0));
    }

    #[test]
    fn bare_codes_take_the_market_suffix() {
        let adapter =
            CsvFundamentalsAdapter::from_csv("symbol,pe\n2330,25.3\n^TWII,9\n", ".TW").unwrap();
        assert_eq!(adapter.fundamentals("2330.TW").unwrap().unwrap().pe, Some(25.3));
        assert_eq!(adapter.fundamentals("2330").unwrap(), None);
        assert_eq!(adapter.fundamentals("^twii").unwrap().unwrap().pe, Some(9.0));
    }

    #[test]
    fn missing_symbol_column_fails() {
        assert!(CsvFundamentalsAdapter::from_csv("pe,eps\n1,2\n", ".TW").is_err());
    }
}
