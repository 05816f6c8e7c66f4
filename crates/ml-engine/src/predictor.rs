use analysis_core::AnalysisError;
use chrono::{Duration, NaiveDate};
use ndarray::{s, Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::feature_frame::{FeatureFrame, TARGET_COLUMN};
use crate::model::{SequenceModel, TrainingOptions, TrainingReport};
use crate::scaler::MinMaxScaler;
use crate::window::prepare_data;

/// Hyperparameters of the close-price forecaster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    pub lookback: usize,
    pub epochs: usize,
    pub batch_size: usize,
    pub hidden_units: usize,
    pub dropout: f64,
    pub learning_rate: f64,
    /// Fixed seed for weight init, dropout and shuffling. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            lookback: 60,
            epochs: 25,
            batch_size: 32,
            hidden_units: 50,
            dropout: 0.2,
            learning_rate: 0.001,
            seed: None,
        }
    }
}

impl ForecastConfig {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.lookback == 0 || self.epochs == 0 || self.batch_size == 0 || self.hidden_units == 0 {
            return Err(AnalysisError::InvalidInput(
                "lookback, epochs, batch_size and hidden_units must be positive".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(AnalysisError::InvalidInput(format!(
                "dropout must be in [0, 1), got {}",
                self.dropout
            )));
        }
        if self.learning_rate <= 0.0 || !self.learning_rate.is_finite() {
            return Err(AnalysisError::InvalidInput(format!(
                "learning rate must be positive, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }
}

/// Everything a rollout needs from the training call that produced it
#[derive(Debug, Clone)]
struct TrainedState {
    model: SequenceModel,
    target_scaler: MinMaxScaler,
    target_index: usize,
    /// Last `lookback` rows of the scaled training matrix
    seed_window: Array2<f64>,
    last_date: NaiveDate,
}

/// LSTM close-price forecaster with autoregressive multi-step rollout.
///
/// Each `train` call fits fresh scalers and a fresh model; a call that fails
/// validation leaves the previous state in place.
#[derive(Debug, Clone)]
pub struct StockPredictor {
    config: ForecastConfig,
    state: Option<TrainedState>,
}

impl StockPredictor {
    pub fn new(config: ForecastConfig) -> Self {
        Self { config, state: None }
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    pub fn is_trained(&self) -> bool {
        self.state.is_some()
    }

    pub fn train(&mut self, frame: &FeatureFrame) -> Result<TrainingReport, AnalysisError> {
        self.config.validate()?;
        let lookback = self.config.lookback;
        let prepared = prepare_data(frame, TARGET_COLUMN, lookback)?;
        let last_date = frame.last_date().ok_or(AnalysisError::InsufficientData {
            required: lookback,
            available: 0,
        })?;

        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        info!(
            examples = prepared.n_examples(),
            lookback,
            features = frame.n_features(),
            epochs = self.config.epochs,
            "Training forecaster"
        );

        let mut model = SequenceModel::new(
            frame.n_features(),
            self.config.hidden_units,
            self.config.dropout,
            &mut rng,
        );
        let options = TrainingOptions {
            epochs: self.config.epochs,
            batch_size: self.config.batch_size,
            learning_rate: self.config.learning_rate,
        };
        let report = model.fit(&prepared.inputs, &prepared.labels, &options, &mut rng)?;

        info!(final_loss = report.final_loss, "Training complete");

        let rows = prepared.scaled.nrows();
        let seed_window = prepared.scaled.slice(s![rows - lookback.., ..]).to_owned();

        self.state = Some(TrainedState {
            model,
            target_scaler: prepared.target_scaler,
            target_index: prepared.target_index,
            seed_window,
            last_date,
        });

        Ok(report)
    }

    /// Predicts `days` closing prices in price units, one per calendar day
    /// after the last training date.
    ///
    /// Each prediction is fed back as the next window's last row: a copy of
    /// the previous last row with only the target column replaced.
    pub fn predict_future(&self, days: usize) -> Result<Vec<f64>, AnalysisError> {
        let state = self.state.as_ref().ok_or(AnalysisError::ModelNotTrained)?;

        let mut window = state.seed_window.clone();
        let mut predictions = Vec::with_capacity(days);

        for _ in 0..days {
            let scaled = state.model.predict(window.view());
            predictions.push(state.target_scaler.inverse_value(0, scaled));

            let mut next_row = window.row(window.nrows() - 1).to_owned();
            next_row[state.target_index] = scaled;
            roll_window(&mut window, next_row.view());
        }

        Ok(predictions)
    }

    /// Calendar dates matching `predict_future(days)`.
    pub fn forecast_dates(&self, days: usize) -> Result<Vec<NaiveDate>, AnalysisError> {
        let state = self.state.as_ref().ok_or(AnalysisError::ModelNotTrained)?;
        Ok((1..=days)
            .map(|i| state.last_date + Duration::days(i as i64))
            .collect())
    }
}

fn roll_window(window: &mut Array2<f64>, next_row: ArrayView1<f64>) {
    let rows = window.nrows();
    for r in 1..rows {
        let row = window.row(r).to_owned();
        window.row_mut(r - 1).assign(&row);
    }
    window.row_mut(rows - 1).assign(&next_row);
}
