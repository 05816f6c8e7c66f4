use chrono::{DateTime, NaiveDate, Utc};
use ml_engine::TrainingReport;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForecastDirection {
    Up,
    Down,
}

/// Forecast for one ticker as shown on the dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastResult {
    pub symbol: String,
    pub currency: String,
    /// One calendar day per prediction, starting the day after the last bar
    pub dates: Vec<NaiveDate>,
    pub predictions: Vec<f64>,
    pub current_price: f64,
    pub final_price: f64,
    pub percent_change: f64,
    pub direction: ForecastDirection,
    /// News sentiment fed into the feature frame
    pub sentiment_score: f64,
    pub training: TrainingReport,
    pub generated_at: DateTime<Utc>,
}

impl ForecastResult {
    pub fn new(
        symbol: String,
        currency: String,
        current_price: f64,
        sentiment_score: f64,
        dates: Vec<NaiveDate>,
        predictions: Vec<f64>,
        training: TrainingReport,
    ) -> Self {
        let final_price = predictions.last().copied().unwrap_or(current_price);
        let percent_change = if current_price != 0.0 {
            (final_price - current_price) / current_price * 100.0
        } else {
            0.0
        };
        let direction = if percent_change > 0.0 {
            ForecastDirection::Up
        } else {
            ForecastDirection::Down
        };

        Self {
            symbol,
            currency,
            dates,
            predictions,
            current_price,
            final_price,
            percent_change,
            direction,
            sentiment_score,
            training,
            generated_at: Utc::now(),
        }
    }
}
