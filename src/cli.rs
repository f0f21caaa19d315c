//! CLI definition and dispatch.

use chrono::{DateTime, FixedOffset, Utc};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_fundamentals_adapter::CsvFundamentalsAdapter;
use crate::adapters::csv_subscriber_adapter::CsvSubscriberAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::text_notifier::{TextNotifier, DEFAULT_VOLUME_BADGE};
use crate::domain::backtest::{BacktestConfig, BacktestResult, DEFAULT_INITIAL_CAPITAL};
use crate::domain::batch::{backtest_instrument, fetch_all, run_batch, InstrumentOutcome};
use crate::domain::config_validation::{
    parse_date, validate_backtest_config, validate_backtest_settings, validate_common_config,
    validate_scan_config,
};
use crate::domain::error::KdtraderError;
use crate::domain::frame::IndicatorParams;
use crate::domain::market_trend::DEFAULT_INDEX_PERIOD;
use crate::domain::scan::{run_scan, ScanConfig, ScanPorts, ScanReport, DEFAULT_INDEX_SYMBOL};
use crate::domain::signal::SignalRules;
use crate::domain::universe::{parse_codes, DEFAULT_SUFFIX};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::fundamentals_port::FundamentalsPort;
use crate::ports::notification_port::NotificationPort;

#[derive(Parser, Debug)]
#[command(name = "kdtrader", about = "Stochastic KD signal scanner and backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Backtest the signal rules over historical bars
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Comma-separated codes, overriding [backtest] codes
        #[arg(long)]
        codes: Option<String>,
    },
    /// Scan subscribed symbols for today's signals and notify subscribers
    Scan {
        #[arg(short, long)]
        config: PathBuf,
        /// Write notifications to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest { config, codes } => run_backtest(&config, codes.as_deref()),
        Command::Scan { config, output } => run_scan_command(&config, output.as_deref()),
        Command::Validate { config } => run_validate(&config),
    }
}

fn fail(err: &KdtraderError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| fail(&e))
}

fn period(config: &dyn ConfigPort, key: &str, default: usize) -> Result<usize, KdtraderError> {
    let value = config.get_int("indicators", key, default as i64);
    usize::try_from(value)
        .ok()
        .filter(|p| *p > 0)
        .ok_or_else(|| KdtraderError::ConfigInvalid {
            section: "indicators".into(),
            key: key.into(),
            reason: format!("{} must be a positive integer", key),
        })
}

pub fn build_indicator_params(config: &dyn ConfigPort) -> Result<IndicatorParams, KdtraderError> {
    let d = IndicatorParams::default();
    Ok(IndicatorParams {
        stoch_k: period(config, "stoch_k", d.stoch_k)?,
        stoch_d: period(config, "stoch_d", d.stoch_d)?,
        stoch_smooth: period(config, "stoch_smooth", d.stoch_smooth)?,
        trend_sma: period(config, "trend_sma", d.trend_sma)?,
        rsi: period(config, "rsi", d.rsi)?,
        macd_fast: period(config, "macd_fast", d.macd_fast)?,
        macd_slow: period(config, "macd_slow", d.macd_slow)?,
        macd_signal: period(config, "macd_signal", d.macd_signal)?,
        volume_sma: period(config, "volume_sma", d.volume_sma)?,
    })
}

pub fn build_signal_rules(config: &dyn ConfigPort) -> SignalRules {
    let d = SignalRules::default();
    SignalRules {
        oversold: config.get_double("signal", "oversold", d.oversold),
        overbought: config.get_double("signal", "overbought", d.overbought),
        passivation_rsi: config.get_double("signal", "passivation_rsi", d.passivation_rsi),
    }
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, KdtraderError> {
    let start = config.get_string("backtest", "start_date");
    let end = config.get_string("backtest", "end_date");
    Ok(BacktestConfig {
        initial_capital: config.get_double("backtest", "initial_capital", DEFAULT_INITIAL_CAPITAL),
        start_date: parse_date(start.as_deref(), "start_date")?,
        end_date: parse_date(end.as_deref(), "end_date")?,
    })
}

fn default_suffix(config: &dyn ConfigPort) -> String {
    config
        .get_string("data", "default_suffix")
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| DEFAULT_SUFFIX.to_string())
}

pub fn build_scan_config(config: &dyn ConfigPort) -> Result<ScanConfig, KdtraderError> {
    let defaults = ScanConfig::default();
    let index_period = config.get_int("market", "sma_period", DEFAULT_INDEX_PERIOD as i64);
    Ok(ScanConfig {
        trend_filter: config.get_bool("market", "trend_filter", defaults.trend_filter),
        index_symbol: config
            .get_string("market", "index")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_INDEX_SYMBOL.to_string()),
        index_period: usize::try_from(index_period).map_err(|_| KdtraderError::ConfigInvalid {
            section: "market".into(),
            key: "sma_period".into(),
            reason: "sma_period must be a positive integer".into(),
        })?,
        index_lookback_days: config.get_int("market", "lookback_days", defaults.index_lookback_days),
        lookback_days: config.get_int("scan", "lookback_days", defaults.lookback_days),
        fundamentals: fundamentals_path(config).is_some(),
        default_suffix: default_suffix(config),
        params: build_indicator_params(config)?,
        rules: build_signal_rules(config),
    })
}

fn fundamentals_path(config: &dyn ConfigPort) -> Option<PathBuf> {
    config
        .get_string("scan", "fundamentals")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

/// Badge threshold from `[scan] volume_badge`; zero disables the badge.
pub fn volume_badge(config: &dyn ConfigPort) -> Option<f64> {
    Some(config.get_double("scan", "volume_badge", DEFAULT_VOLUME_BADGE)).filter(|t| *t > 0.0)
}

/// Timestamp "now" in the configured `[scan] utc_offset_hours` zone.
pub fn scan_clock(config: &dyn ConfigPort) -> Result<DateTime<FixedOffset>, KdtraderError> {
    let hours = config.get_int("scan", "utc_offset_hours", 8);
    let offset = i32::try_from(hours * 3600)
        .ok()
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| KdtraderError::ConfigInvalid {
            section: "scan".into(),
            key: "utc_offset_hours".into(),
            reason: format!("offset {} out of range", hours),
        })?;
    Ok(Utc::now().with_timezone(&offset))
}

/// Codes from `--codes` when given, otherwise `[backtest] codes`, normalized
/// with the `[data] default_suffix`.
pub fn resolve_codes(
    codes_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<Vec<String>, KdtraderError> {
    let (raw, key) = match codes_override {
        Some(codes) => (codes.to_string(), "--codes"),
        None => (
            config
                .get_string("backtest", "codes")
                .ok_or_else(|| KdtraderError::ConfigMissing {
                    section: "backtest".into(),
                    key: "codes".into(),
                })?,
            "codes",
        ),
    };
    parse_codes(&raw, &default_suffix(config)).map_err(|e| KdtraderError::ConfigInvalid {
        section: "backtest".into(),
        key: key.into(),
        reason: e.to_string(),
    })
}

fn data_adapter(config: &dyn ConfigPort) -> Result<CsvAdapter, KdtraderError> {
    let dir = config
        .get_string("data", "dir")
        .ok_or_else(|| KdtraderError::ConfigMissing {
            section: "data".into(),
            key: "dir".into(),
        })?;
    Ok(CsvAdapter::new(PathBuf::from(dir.trim())))
}

fn run_backtest(config_path: &Path, codes_override: Option<&str>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    // --codes stands in for [backtest] codes
    let validation = validate_common_config(&adapter).and_then(|()| {
        if codes_override.is_some() {
            validate_backtest_settings(&adapter)
        } else {
            validate_backtest_config(&adapter)
        }
    });
    if let Err(e) = validation {
        return fail(&e);
    }

    let setup = (|| {
        Ok::<_, KdtraderError>((
            build_indicator_params(&adapter)?,
            build_signal_rules(&adapter),
            build_backtest_config(&adapter)?,
            resolve_codes(codes_override, &adapter)?,
            data_adapter(&adapter)?,
        ))
    })();
    let (params, rules, bt_config, codes, data_port) = match setup {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    run_backtest_pipeline(&data_port, params, &rules, &bt_config, &codes)
}

/// Backtest every code independently. Outcomes keep the order of `codes`.
pub fn backtest_codes(
    data_port: &dyn DataPort,
    params: IndicatorParams,
    rules: &SignalRules,
    bt_config: &BacktestConfig,
    codes: &[String],
) -> Vec<InstrumentOutcome<BacktestResult>> {
    let fetched = fetch_all(data_port, codes, bt_config.start_date, bt_config.end_date);
    run_batch(fetched, |symbol, bars| {
        backtest_instrument(symbol, bars, params, rules, bt_config)
    })
}

pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    params: IndicatorParams,
    rules: &SignalRules,
    bt_config: &BacktestConfig,
    codes: &[String],
) -> ExitCode {
    eprintln!(
        "Running backtest: {} codes, {} to {}",
        codes.len(),
        bt_config.start_date,
        bt_config.end_date,
    );

    let outcomes = backtest_codes(data_port, params, rules, bt_config, codes);
    print_backtest_outcomes(&outcomes);

    if outcomes.iter().any(InstrumentOutcome::is_ok) {
        return ExitCode::SUCCESS;
    }
    match outcomes.iter().find_map(|o| o.result.as_ref().err()) {
        Some(e) => e.into(),
        None => {
            eprintln!("error: no codes to backtest");
            ExitCode::from(2)
        }
    }
}

fn print_backtest_outcomes(outcomes: &[InstrumentOutcome<BacktestResult>]) {
    for outcome in outcomes {
        match &outcome.result {
            Ok(result) => {
                let s = &result.summary;
                eprintln!("\n=== {} ===", outcome.symbol);
                eprintln!("Initial Capital:  {:.2}", s.initial_capital);
                eprintln!("Final Value:      {:.2}", s.final_value);
                eprintln!("ROI:              {:.2}%", s.roi);
                eprintln!("Total Profit:     {:.2}", s.total_profit);
                eprintln!("Max Drawdown:     -{:.1}%", s.max_drawdown_pct);
                eprintln!(
                    "Trades:           {} ({} won, {} lost)",
                    s.trade_count, s.win_count, s.loss_count
                );
                eprintln!("Win Rate:         {:.1}%", s.win_rate);
                eprintln!("Profit Factor:    {:.2}", s.profit_factor);
                for trade in &result.portfolio.closed_trades {
                    let sign = if trade.pnl >= 0.0 { "+" } else { "" };
                    eprintln!(
                        "  {} -> {}  {} shares  {:.2} -> {:.2}  {}{:.2}",
                        trade.entry_date,
                        trade.exit_date,
                        trade.shares,
                        trade.entry_price,
                        trade.exit_price,
                        sign,
                        trade.pnl,
                    );
                }
                if let Some(open) = &result.portfolio.position {
                    eprintln!(
                        "  open since {}: {} shares @ {:.2}",
                        open.entry_date, open.shares, open.entry_price
                    );
                }
            }
            Err(e) => eprintln!("\n=== {} ===\nskipped: {}", outcome.symbol, e),
        }
    }
}

fn run_scan_command(config_path: &Path, output: Option<&Path>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_common_config(&adapter).and_then(|()| validate_scan_config(&adapter)) {
        return fail(&e);
    }

    let setup = (|| {
        let scan_config = build_scan_config(&adapter)?;
        let data_port = data_adapter(&adapter)?;
        let subscribers_path = adapter
            .get_string("scan", "subscribers")
            .ok_or_else(|| KdtraderError::ConfigMissing {
                section: "scan".into(),
                key: "subscribers".into(),
            })?;
        let subscribers = CsvSubscriberAdapter::new(PathBuf::from(subscribers_path.trim()));
        let fundamentals = fundamentals_path(&adapter)
            .map(|path| CsvFundamentalsAdapter::from_file(path, &scan_config.default_suffix))
            .transpose()?;
        let now = scan_clock(&adapter)?;
        Ok::<_, KdtraderError>((scan_config, data_port, subscribers, fundamentals, now))
    })();
    let (scan_config, data_port, subscribers, fundamentals, now) = match setup {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    let sink: Box<dyn Write> = match output {
        Some(path) => match File::create(path) {
            Ok(file) => Box::new(file),
            Err(e) => return fail(&KdtraderError::Io(e)),
        },
        None => Box::new(io::stdout()),
    };
    let notifier = TextNotifier::new(sink, volume_badge(&adapter));

    let ports = ScanPorts {
        data: &data_port,
        subscribers: &subscribers,
        fundamentals: fundamentals.as_ref().map(|f| f as &dyn FundamentalsPort),
        notifier: &notifier as &dyn NotificationPort,
    };
    run_scan_pipeline(&ports, &scan_config, now)
}

pub fn run_scan_pipeline(
    ports: &ScanPorts<'_>,
    scan_config: &ScanConfig,
    now: DateTime<FixedOffset>,
) -> ExitCode {
    match run_scan(ports, scan_config, now) {
        Ok(report) => {
            print_scan_report(&report);
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn print_scan_report(report: &ScanReport) {
    if let Some(trend) = &report.trend {
        eprintln!("Market: {} ({})", trend.regime(), trend.rationale());
    }
    for (symbol, e) in report.errors() {
        eprintln!("  {}: skipped ({})", symbol, e);
    }
    eprintln!(
        "Scanned {} symbols: {} alerts, {} blocked, {} delivered, {} failed",
        report.outcomes.len(),
        report.alerts.len(),
        report.blocked,
        report.delivered,
        report.failed,
    );
}

fn run_validate(config_path: &Path) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_common_config(&adapter) {
        return fail(&e);
    }
    match data_adapter(&adapter).and_then(|data| data.list_symbols()) {
        Ok(symbols) => eprintln!("Data: {} symbol files", symbols.len()),
        Err(e) => eprintln!("warning: {e}"),
    }
    let has_section = |section: &str, key: &str| adapter.get_string(section, key).is_some();

    if (has_section("backtest", "codes") || has_section("backtest", "start_date"))
        && let Err(e) = validate_backtest_config(&adapter).and_then(|()| {
            resolve_codes(None, &adapter).map(|codes| {
                eprintln!("Backtest: {} codes", codes.len());
            })
        })
    {
        return fail(&e);
    }
    if has_section("scan", "subscribers") {
        if let Err(e) = validate_scan_config(&adapter) {
            return fail(&e);
        }
        eprintln!("Scan: ok");
    }

    eprintln!("Config is valid.");
    ExitCode::SUCCESS
}
