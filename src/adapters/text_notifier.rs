//! Plain-text notification sink.
//!
//! Renders each notification as a short block of text and writes it, with
//! its recipient, to any `Write` (stdout, a file, a buffer in tests).

use crate::domain::error::KdtraderError;
use crate::domain::notification::{Fundamentals, Notification};
use crate::domain::signal::SignalKind;
use crate::ports::notification_port::NotificationPort;
use std::io::Write;
use std::sync::Mutex;

pub const DEFAULT_VOLUME_BADGE: f64 = 2.0;

pub struct TextNotifier<W: Write> {
    out: Mutex<W>,
    volume_badge: Option<f64>,
}

impl<W: Write> TextNotifier<W> {
    /// `volume_badge` is the volume ratio at which the surge line appears;
    /// `None` never shows it.
    pub fn new(out: W, volume_badge: Option<f64>) -> Self {
        Self {
            out: Mutex::new(out),
            volume_badge,
        }
    }

    pub fn into_inner(self) -> Result<W, KdtraderError> {
        self.out.into_inner().map_err(|_| KdtraderError::Notification {
            reason: "notifier output poisoned".to_string(),
        })
    }
}

fn headline(kind: SignalKind) -> &'static str {
    match kind {
        SignalKind::Buy => "strong buy",
        SignalKind::Hold => "overbought but passivated, keep holding",
        SignalKind::Sell => "overbought, sell",
        SignalKind::None => "no signal",
    }
}

fn figure(value: Option<f64>, render: impl Fn(f64) -> String) -> String {
    value.map_or_else(|| "-".to_string(), render)
}

fn fundamentals_line(f: &Fundamentals) -> String {
    format!(
        "PE {} | EPS {} | Yield {}",
        figure(f.pe, |v| format!("{:.1}x", v)),
        figure(f.eps, |v| format!("{:.2}", v)),
        figure(f.dividend_yield, |v| format!("{:.1}%", v)),
    )
}

/// Message body for one notification.
pub fn render(notification: &Notification, volume_badge: Option<f64>) -> String {
    let evidence = &notification.signal.evidence;
    let mut lines = vec![
        format!(
            "[{}] {} @ {:.2} ({})",
            notification.kind(),
            notification.symbol,
            evidence.price,
            headline(notification.kind())
        ),
        format!(
            "K {:.2} / D {:.2} / RSI {:.1}",
            evidence.k, evidence.d, evidence.rsi
        ),
    ];

    if let Some(threshold) = volume_badge
        && notification.is_volume_surge(threshold)
        && let Some(ratio) = notification.volume_ratio()
    {
        lines.push(format!("Volume surge {:.1}x", ratio));
    }
    if let Some(f) = &notification.fundamentals {
        lines.push(fundamentals_line(f));
    }
    lines.push(notification.timestamp.format("%Y-%m-%d %H:%M (UTC%:z)").to_string());

    lines.join("\n")
}

impl<W: Write> NotificationPort for TextNotifier<W> {
    fn deliver(&self, recipient: &str, notification: &Notification) -> Result<(), KdtraderError> {
        let body = render(notification, self.volume_badge);
        let mut out = self.out.lock().map_err(|_| KdtraderError::Notification {
            reason: "notifier output poisoned".to_string(),
        })?;
        writeln!(out, "to: {}\n{}\n", recipient, body).map_err(|e| {
            KdtraderError::Notification {
                reason: format!("write to {} failed: {}", recipient, e),
            }
        })?;
        out.flush().map_err(|e| KdtraderError::Notification {
            reason: e.to_string(),
        })
    }
}
