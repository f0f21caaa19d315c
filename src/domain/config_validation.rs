//! Configuration validation.
//!
//! Every pipeline validates its sections before touching any data.

use crate::domain::error::KdtraderError;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

/// Sections shared by every pipeline: `[data]`, `[indicators]`, `[signal]`.
pub fn validate_common_config(config: &dyn ConfigPort) -> Result<(), KdtraderError> {
    validate_data_dir(config)?;
    validate_indicator_periods(config)?;
    validate_macd_order(config)?;
    validate_signal_thresholds(config)?;
    Ok(())
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), KdtraderError> {
    validate_backtest_settings(config)?;
    validate_codes(config)?;
    Ok(())
}

/// `[backtest]` capital and date range, for runs whose codes come from elsewhere.
pub fn validate_backtest_settings(config: &dyn ConfigPort) -> Result<(), KdtraderError> {
    validate_initial_capital(config)?;
    validate_dates(config)?;
    Ok(())
}

pub fn validate_scan_config(config: &dyn ConfigPort) -> Result<(), KdtraderError> {
    require_non_empty(config, "scan", "subscribers")?;
    positive_int(config, "scan", "lookback_days", 183)?;
    validate_volume_badge(config)?;
    validate_utc_offset(config)?;
    if config.get_bool("market", "trend_filter", true) {
        positive_int(config, "market", "sma_period", 20)?;
        positive_int(config, "market", "lookback_days", 61)?;
    }
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> KdtraderError {
    KdtraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn require_non_empty(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), KdtraderError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(KdtraderError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

fn positive_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<(), KdtraderError> {
    if config.get_int(section, key, default) <= 0 {
        return Err(invalid(section, key, format!("{} must be a positive integer", key)));
    }
    Ok(())
}

fn validate_data_dir(config: &dyn ConfigPort) -> Result<(), KdtraderError> {
    require_non_empty(config, "data", "dir")
}

const INDICATOR_PERIODS: [(&str, i64); 9] = [
    ("stoch_k", 14),
    ("stoch_d", 3),
    ("stoch_smooth", 3),
    ("trend_sma", 60),
    ("rsi", 14),
    ("macd_fast", 12),
    ("macd_slow", 26),
    ("macd_signal", 9),
    ("volume_sma", 5),
];

fn validate_indicator_periods(config: &dyn ConfigPort) -> Result<(), KdtraderError> {
    for (key, default) in INDICATOR_PERIODS {
        positive_int(config, "indicators", key, default)?;
    }
    Ok(())
}

fn validate_macd_order(config: &dyn ConfigPort) -> Result<(), KdtraderError> {
    let fast = config.get_int("indicators", "macd_fast", 12);
    let slow = config.get_int("indicators", "macd_slow", 26);
    if fast >= slow {
        return Err(invalid(
            "indicators",
            "macd_fast",
            "macd_fast must be shorter than macd_slow",
        ));
    }
    Ok(())
}

fn validate_signal_thresholds(config: &dyn ConfigPort) -> Result<(), KdtraderError> {
    let oversold = config.get_double("signal", "oversold", 20.0);
    let overbought = config.get_double("signal", "overbought", 80.0);
    let passivation = config.get_double("signal", "passivation_rsi", 70.0);

    for (key, value) in [
        ("oversold", oversold),
        ("overbought", overbought),
        ("passivation_rsi", passivation),
    ] {
        if !(0.0..=100.0).contains(&value) {
            return Err(invalid("signal", key, format!("{} must be between 0 and 100", key)));
        }
    }
    if oversold >= overbought {
        return Err(invalid(
            "signal",
            "oversold",
            "oversold must be below overbought",
        ));
    }
    Ok(())
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), KdtraderError> {
    let value = config.get_double("backtest", "initial_capital", 100_000.0);
    if !(value.is_finite() && value > 0.0) {
        return Err(invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), KdtraderError> {
    let start_str = config.get_string("backtest", "start_date");
    let end_str = config.get_string("backtest", "end_date");

    let start_date = parse_date(start_str.as_deref(), "start_date")?;
    let end_date = parse_date(end_str.as_deref(), "end_date")?;

    if start_date >= end_date {
        return Err(invalid(
            "backtest",
            "start_date",
            "start_date must be before end_date",
        ));
    }
    Ok(())
}

pub(crate) fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, KdtraderError> {
    match value {
        None => Err(KdtraderError::ConfigMissing {
            section: "backtest".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            invalid(
                "backtest",
                field,
                format!("invalid {} format, expected YYYY-MM-DD", field),
            )
        }),
    }
}

fn validate_codes(config: &dyn ConfigPort) -> Result<(), KdtraderError> {
    require_non_empty(config, "backtest", "codes")
}

fn validate_volume_badge(config: &dyn ConfigPort) -> Result<(), KdtraderError> {
    let value = config.get_double("scan", "volume_badge", 2.0);
    if value < 0.0 {
        return Err(invalid(
            "scan",
            "volume_badge",
            "volume_badge must be non-negative (0 disables it)",
        ));
    }
    Ok(())
}

fn validate_utc_offset(config: &dyn ConfigPort) -> Result<(), KdtraderError> {
    let value = config.get_int("scan", "utc_offset_hours", 8);
    if !(-12..=14).contains(&value) {
        return Err(invalid(
            "scan",
            "utc_offset_hours",
            "utc_offset_hours must be between -12 and 14",
        ));
    }
    Ok(())
}
