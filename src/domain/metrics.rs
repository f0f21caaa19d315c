//! Backtest summary statistics.
//!
//! ROI and win rate are percentages. A trade wins when its P&L is strictly
//! positive; with zero trades the win rate is 0.

use super::portfolio::{EquityPoint, Portfolio};

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestSummary {
    pub initial_capital: f64,
    pub final_value: f64,
    pub roi: f64,
    pub trade_count: usize,
    pub win_count: usize,
    pub loss_count: usize,
    pub win_rate: f64,
    pub total_profit: f64,
    pub max_drawdown_pct: f64,
    pub profit_factor: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub avg_trade_duration: f64,
}

impl BacktestSummary {
    /// Summarise a finished simulation, valuing any open holding at
    /// `last_close`.
    pub fn compute(portfolio: &Portfolio, last_close: f64) -> Self {
        let initial_capital = portfolio.initial_capital;
        let final_value = portfolio.equity(last_close);
        let roi = if initial_capital > 0.0 {
            (final_value - initial_capital) / initial_capital * 100.0
        } else {
            0.0
        };

        let trades = &portfolio.closed_trades;
        let mut win_count = 0usize;
        let mut loss_count = 0usize;
        let mut total_wins = 0.0_f64;
        let mut total_losses = 0.0_f64;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;
        let mut total_duration_days = 0i64;

        for trade in trades {
            let pnl = trade.pnl;
            if pnl > 0.0 {
                win_count += 1;
                total_wins += pnl;
                largest_win = largest_win.max(pnl);
            } else if pnl < 0.0 {
                loss_count += 1;
                total_losses += pnl.abs();
                largest_loss = largest_loss.max(pnl.abs());
            }
            total_duration_days += trade.holding_days();
        }

        let trade_count = trades.len();
        let win_rate = if trade_count > 0 {
            win_count as f64 / trade_count as f64 * 100.0
        } else {
            0.0
        };

        let profit_factor = if total_losses > 0.0 {
            total_wins / total_losses
        } else if total_wins > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        let avg_win = if win_count > 0 {
            total_wins / win_count as f64
        } else {
            0.0
        };
        let avg_loss = if loss_count > 0 {
            total_losses / loss_count as f64
        } else {
            0.0
        };
        let avg_trade_duration = if trade_count > 0 {
            total_duration_days as f64 / trade_count as f64
        } else {
            0.0
        };

        BacktestSummary {
            initial_capital,
            final_value,
            roi,
            trade_count,
            win_count,
            loss_count,
            win_rate,
            total_profit: trades.iter().map(|t| t.pnl).sum(),
            max_drawdown_pct: max_drawdown_pct(&portfolio.equity_curve),
            profit_factor,
            avg_win,
            avg_loss,
            largest_win,
            largest_loss,
            avg_trade_duration,
        }
    }
}

/// Largest peak-to-trough fall of the equity curve, in percent of the peak.
fn max_drawdown_pct(equity_curve: &[EquityPoint]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;

    for point in equity_curve {
        if point.equity > peak {
            peak = point.equity;
        } else if peak > 0.0 {
            max_dd = max_dd.max((peak - point.equity) / peak);
        }
    }

    max_dd * 100.0
}
