use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Price or company data could not be retrieved for a ticker.
    #[error("Data unavailable for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    #[error("Insufficient data: {available} rows available, more than {required} required")]
    InsufficientData { required: usize, available: usize },

    #[error("Model not trained: call train() before predict_future()")]
    ModelNotTrained,

    #[error("Classifier error: {0}")]
    Classifier(String),

    #[error("News unavailable for {0}: primary and fallback sources returned nothing")]
    NewsUnavailable(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("API error: {0}")]
    ApiError(String),
}

impl AnalysisError {
    pub fn data_unavailable(symbol: &str, reason: impl Into<String>) -> Self {
        AnalysisError::DataUnavailable {
            symbol: symbol.to_string(),
            reason: reason.into(),
        }
    }
}
