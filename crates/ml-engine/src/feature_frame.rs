use analysis_core::AnalysisError;
use chrono::NaiveDate;
use ndarray::Array2;
use technical_analysis::IndicatorRow;

pub const TARGET_COLUMN: &str = "Close";

pub const FEATURE_COLUMNS: [&str; 15] = [
    "Open",
    "High",
    "Low",
    "Close",
    "Volume",
    "RSI",
    "MACD",
    "MACD_Hist",
    "MACD_Signal",
    "BB_Lower",
    "BB_Mid",
    "BB_Upper",
    "BB_Bandwidth",
    "BB_Percent",
    "Sentiment",
];

/// Number of most recent rows that carry the news sentiment score.
pub const SENTIMENT_ROWS: usize = 5;

/// Numeric model input: one row per indicator row, dates kept alongside.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureFrame {
    dates: Vec<NaiveDate>,
    columns: Vec<String>,
    data: Array2<f64>,
}

impl FeatureFrame {
    pub fn new(dates: Vec<NaiveDate>, columns: Vec<String>, data: Array2<f64>) -> Result<Self, AnalysisError> {
        if data.nrows() != dates.len() || data.ncols() != columns.len() {
            return Err(AnalysisError::InvalidInput(format!(
                "feature frame shape {:?} does not match {} dates and {} columns",
                data.shape(),
                dates.len(),
                columns.len()
            )));
        }
        Ok(Self { dates, columns, data })
    }

    /// Builds the frame from the truncated indicator table. `sentiment` is
    /// written to the last `SENTIMENT_ROWS` rows; earlier rows hold 0.0.
    pub fn from_indicators(rows: &[IndicatorRow], sentiment: f64) -> Self {
        let sentiment_start = rows.len().saturating_sub(SENTIMENT_ROWS);
        let mut data = Array2::zeros((rows.len(), FEATURE_COLUMNS.len()));

        for (i, row) in rows.iter().enumerate() {
            let values = [
                row.bar.open,
                row.bar.high,
                row.bar.low,
                row.bar.close,
                row.bar.volume,
                row.rsi,
                row.macd,
                row.macd_histogram,
                row.macd_signal,
                row.bb_lower,
                row.bb_mid,
                row.bb_upper,
                row.bb_bandwidth,
                row.bb_percent,
                if i >= sentiment_start { sentiment } else { 0.0 },
            ];
            for (j, value) in values.into_iter().enumerate() {
                data[[i, j]] = value;
            }
        }

        Self {
            dates: rows.iter().map(|r| r.bar.date).collect(),
            columns: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            data,
        }
    }

    pub fn len(&self) -> usize {
        self.data.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.data.nrows() == 0
    }

    pub fn n_features(&self) -> usize {
        self.data.ncols()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        self.column_index(name).map(|j| self.data.column(j).to_vec())
    }
}
