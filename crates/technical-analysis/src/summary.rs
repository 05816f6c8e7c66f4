use analysis_core::currency_symbol;
use serde::{Deserialize, Serialize};

use crate::frame::IndicatorRow;

/// Headline technical metrics for the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalSummary {
    pub symbol: String,
    pub currency: String,
    pub current_price: f64,
    /// Absolute change against the previous close (0.0 for a single row).
    pub change: f64,
    pub change_percent: f64,
    pub rsi: f64,
    pub macd: f64,
    /// Upper minus lower Bollinger band on the last row.
    pub bb_width: f64,
    pub period_high: f64,
    pub period_low: f64,
}

impl TechnicalSummary {
    /// Summarizes a truncated indicator table. Returns `None` when the table is empty.
    pub fn from_rows(symbol: &str, rows: &[IndicatorRow]) -> Option<Self> {
        let last = rows.last()?;
        let current_price = last.bar.close;
        let previous = rows
            .len()
            .checked_sub(2)
            .and_then(|i| rows.get(i))
            .map(|r| r.bar.close)
            .unwrap_or(current_price);

        let change = current_price - previous;
        let change_percent = if previous != 0.0 {
            change / previous * 100.0
        } else {
            0.0
        };

        let period_high = rows
            .iter()
            .map(|r| r.bar.high)
            .fold(f64::NEG_INFINITY, f64::max);
        let period_low = rows.iter().map(|r| r.bar.low).fold(f64::INFINITY, f64::min);

        Some(Self {
            symbol: symbol.to_string(),
            currency: currency_symbol(symbol).to_string(),
            current_price,
            change,
            change_percent,
            rsi: last.rsi,
            macd: last.macd,
            bb_width: last.bb_upper - last.bb_lower,
            period_high,
            period_low,
        })
    }
}
