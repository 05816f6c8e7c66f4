use analysis_core::AnalysisError;
use ndarray::{s, Array1, Array2, Array3, Axis};

use crate::feature_frame::FeatureFrame;
use crate::scaler::MinMaxScaler;

/// Supervised dataset built from a feature frame
#[derive(Debug, Clone)]
pub struct PreparedData {
    /// `(T - L, L, F)` scaled input windows
    pub inputs: Array3<f64>,
    /// `(T - L)` scaled target values
    pub labels: Array1<f64>,
    /// The whole frame after feature scaling, `(T, F)`
    pub scaled: Array2<f64>,
    pub feature_scaler: MinMaxScaler,
    pub target_scaler: MinMaxScaler,
    pub target_index: usize,
    pub lookback: usize,
}

impl PreparedData {
    pub fn n_examples(&self) -> usize {
        self.labels.len()
    }
}

/// Scales the frame and cuts it into lookback windows.
///
/// Both scalers are fitted on the entire history. Window `k` holds scaled
/// rows `[k, k + L)` and its label is the scaled target at row `k + L`.
pub fn prepare_data(
    frame: &FeatureFrame,
    target_column: &str,
    lookback: usize,
) -> Result<PreparedData, AnalysisError> {
    let target_index = frame.column_index(target_column).ok_or_else(|| {
        AnalysisError::InvalidInput(format!("feature frame has no '{}' column", target_column))
    })?;

    let rows = frame.len();
    if lookback == 0 || rows <= lookback {
        return Err(AnalysisError::InsufficientData {
            required: lookback,
            available: rows,
        });
    }

    let data = frame.data();
    let feature_scaler = MinMaxScaler::fit(data.view());
    let target = data.slice(s![.., target_index..target_index + 1]);
    let target_scaler = MinMaxScaler::fit(target);

    let scaled = feature_scaler.transform(data.view());
    let scaled_target = target_scaler.transform(target);

    let n_examples = rows - lookback;
    let n_features = frame.n_features();
    let mut inputs = Array3::zeros((n_examples, lookback, n_features));
    let mut labels = Array1::zeros(n_examples);

    for (k, mut window) in inputs.axis_iter_mut(Axis(0)).enumerate() {
        window.assign(&scaled.slice(s![k..k + lookback, ..]));
        labels[k] = scaled_target[[k + lookback, 0]];
    }

    Ok(PreparedData {
        inputs,
        labels,
        scaled,
        feature_scaler,
        target_scaler,
        target_index,
        lookback,
    })
}
