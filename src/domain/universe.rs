//! Symbol lists: parsing, exchange-suffix normalization and de-duplication.

use std::collections::HashSet;

pub const DEFAULT_SUFFIX: &str = ".TW";

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in code list")]
    EmptyToken,

    #[error("duplicate code: {0}")]
    DuplicateCode(String),
}

/// Parse a comma-separated code list, normalizing each code with `suffix`.
pub fn parse_codes(input: &str, suffix: &str) -> Result<Vec<String>, UniverseError> {
    let mut codes = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let code = normalize_symbol(trimmed, suffix);
        if !seen.insert(code.clone()) {
            return Err(UniverseError::DuplicateCode(code));
        }
        codes.push(code);
    }

    Ok(codes)
}

/// Upper-case `code` and append `suffix` unless it already names an
/// exchange (`2330.TW`) or an index (`^TWII`).
pub fn normalize_symbol(code: &str, suffix: &str) -> String {
    let code = code.trim().to_uppercase();
    if code.is_empty() || code.contains('.') || code.starts_with('^') {
        code
    } else {
        format!("{}{}", code, suffix.to_uppercase())
    }
}

/// Distinct symbols in first-seen order.
pub fn unique_symbols<'a>(symbols: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    symbols
        .into_iter()
        .filter(|s| seen.insert(*s))
        .map(str::to_string)
        .collect()
}
