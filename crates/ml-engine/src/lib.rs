//! Feature frame construction and the LSTM close-price forecaster.

pub mod feature_frame;
pub mod lstm;
pub mod model;
pub mod optimizer;
pub mod predictor;
pub mod scaler;
pub mod window;

pub use feature_frame::{FeatureFrame, FEATURE_COLUMNS, SENTIMENT_ROWS, TARGET_COLUMN};
pub use model::{SequenceModel, TrainingOptions, TrainingReport};
pub use predictor::{ForecastConfig, StockPredictor};
pub use scaler::MinMaxScaler;
pub use window::{prepare_data, PreparedData};
