use analysis_core::Bar;
use serde::{Deserialize, Serialize};

use crate::indicators::{bollinger_bands, macd, rsi};

/// Indicator periods applied to the close series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorConfig {
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bb_period: usize,
    pub bb_std_dev: f64,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            bb_period: 20,
            bb_std_dev: 2.0,
        }
    }
}

impl IndicatorConfig {
    /// Number of leading rows for which at least one indicator is undefined.
    pub fn warmup(&self) -> usize {
        let rsi_start = self.rsi_period;
        let macd_start = (self.macd_slow + self.macd_signal).saturating_sub(2);
        let bb_start = self.bb_period.saturating_sub(1);
        rsi_start.max(macd_start).max(bb_start)
    }

    /// Longest lookback of any indicator, counting the row itself. The
    /// indicator table has `len - (max_window - 1)` rows.
    pub fn max_window(&self) -> usize {
        self.warmup() + 1
    }
}

/// Price bar extended with its indicator values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    #[serde(flatten)]
    pub bar: Bar,
    pub rsi: f64,
    pub macd: f64,
    pub macd_histogram: f64,
    pub macd_signal: f64,
    pub bb_lower: f64,
    pub bb_mid: f64,
    pub bb_upper: f64,
    pub bb_bandwidth: f64,
    pub bb_percent: f64,
}

impl IndicatorRow {
    pub fn is_finite(&self) -> bool {
        [
            self.bar.open,
            self.bar.high,
            self.bar.low,
            self.bar.close,
            self.bar.volume,
            self.rsi,
            self.macd,
            self.macd_histogram,
            self.macd_signal,
            self.bb_lower,
            self.bb_mid,
            self.bb_upper,
            self.bb_bandwidth,
            self.bb_percent,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

/// Adds RSI, MACD and Bollinger Bands to a daily bar series.
///
/// Bars are sorted by date and duplicate dates collapse to the last bar seen.
/// Rows whose indicators are still warming up are dropped, so the table is
/// truncated rather than padded.
pub fn add_technical_indicators(bars: &[Bar], config: &IndicatorConfig) -> Vec<IndicatorRow> {
    let mut sorted: Vec<Bar> = bars.to_vec();
    sorted.sort_by_key(|b| b.date);
    sorted.dedup_by(|later, earlier| {
        if later.date == earlier.date {
            *earlier = later.clone();
            true
        } else {
            false
        }
    });

    let warmup = config.warmup();
    if sorted.len() <= warmup {
        tracing::debug!(
            bars = sorted.len(),
            warmup,
            "Not enough bars to compute indicators"
        );
        return vec![];
    }

    let closes: Vec<f64> = sorted.iter().map(|b| b.close).collect();
    let rsi_values = rsi(&closes, config.rsi_period);
    let macd_values = macd(&closes, config.macd_fast, config.macd_slow, config.macd_signal);
    let bands = bollinger_bands(&closes, config.bb_period, config.bb_std_dev);

    let rsi_offset = config.rsi_period;
    let macd_offset = config.macd_slow.saturating_sub(1);
    let signal_offset = (config.macd_slow + config.macd_signal).saturating_sub(2);
    let bb_offset = config.bb_period.saturating_sub(1);

    sorted
        .iter()
        .enumerate()
        .skip(warmup)
        .filter_map(|(i, bar)| {
            let row = IndicatorRow {
                bar: bar.clone(),
                rsi: *rsi_values.get(i.checked_sub(rsi_offset)?)?,
                macd: *macd_values.macd_line.get(i.checked_sub(macd_offset)?)?,
                macd_histogram: *macd_values.histogram.get(i.checked_sub(signal_offset)?)?,
                macd_signal: *macd_values.signal_line.get(i.checked_sub(signal_offset)?)?,
                bb_lower: *bands.lower.get(i.checked_sub(bb_offset)?)?,
                bb_mid: *bands.middle.get(i.checked_sub(bb_offset)?)?,
                bb_upper: *bands.upper.get(i.checked_sub(bb_offset)?)?,
                bb_bandwidth: *bands.bandwidth.get(i.checked_sub(bb_offset)?)?,
                bb_percent: *bands.percent.get(i.checked_sub(bb_offset)?)?,
            };
            row.is_finite().then_some(row)
        })
        .collect()
}
