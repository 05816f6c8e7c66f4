pub mod authenticity;
pub mod error;
pub mod inference;
pub mod registry;
pub mod sentiment;

pub use authenticity::{AuthenticityClassifier, AuthenticityClient, AuthenticityVerdict};
pub use error::{MLError, MLResult};
pub use inference::InferenceEndpoint;
pub use registry::{ClassifierRegistry, ClassifierSet};
pub use sentiment::{SentimentClassifier, SentimentClient, SentimentDistribution};

use std::env;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_INFERENCE_URL: &str = "https://api-inference.huggingface.co";
pub const DEFAULT_SENTIMENT_MODEL: &str = "ProsusAI/finbert";
pub const DEFAULT_AUTHENTICITY_MODEL: &str = "mrm8488/bert-tiny-finetuned-fake-news-detection";

/// Configuration for the hosted classifiers
#[derive(Debug, Clone)]
pub struct MLConfig {
    pub inference_url: String,
    pub api_token: Option<String>,
    pub sentiment_model: String,
    pub authenticity_model: String,
    pub timeout: Duration,
}

impl Default for MLConfig {
    fn default() -> Self {
        Self {
            inference_url: DEFAULT_INFERENCE_URL.to_string(),
            api_token: None,
            sentiment_model: DEFAULT_SENTIMENT_MODEL.to_string(),
            authenticity_model: DEFAULT_AUTHENTICITY_MODEL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl MLConfig {
    pub fn from_env() -> MLResult<Self> {
        let timeout_secs: u64 = env::var("ML_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map_err(|e| MLError::Config(format!("ML_TIMEOUT_SECS: {}", e)))?;

        Ok(Self {
            inference_url: env::var("ML_INFERENCE_URL")
                .unwrap_or_else(|_| DEFAULT_INFERENCE_URL.to_string()),
            api_token: env::var("HF_API_TOKEN").ok().filter(|t| !t.is_empty()),
            sentiment_model: env::var("SENTIMENT_MODEL")
                .unwrap_or_else(|_| DEFAULT_SENTIMENT_MODEL.to_string()),
            authenticity_model: env::var("AUTHENTICITY_MODEL")
                .unwrap_or_else(|_| DEFAULT_AUTHENTICITY_MODEL.to_string()),
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Hosted inference is used when a token is configured or the endpoint
    /// points somewhere other than the public API.
    pub fn inference_enabled(&self) -> bool {
        self.api_token.is_some() || self.inference_url != DEFAULT_INFERENCE_URL
    }

    fn endpoint(&self, model: &str) -> MLResult<InferenceEndpoint> {
        InferenceEndpoint::new(
            self.inference_url.clone(),
            model.to_string(),
            self.api_token.clone(),
            self.timeout,
        )
    }

    /// Builds the HTTP-backed sentiment and authenticity classifiers.
    pub fn http_classifiers(&self) -> MLResult<ClassifierSet> {
        let sentiment = SentimentClient::new(self.endpoint(&self.sentiment_model)?);
        let authenticity = AuthenticityClient::new(self.endpoint(&self.authenticity_model)?);

        Ok(ClassifierSet {
            sentiment: Arc::new(sentiment),
            authenticity: Some(Arc::new(authenticity)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MLConfig::default();
        assert_eq!(config.sentiment_model, "ProsusAI/finbert");
        assert!(!config.inference_enabled());
    }

    #[test]
    fn test_inference_enabled_with_token() {
        let config = MLConfig {
            api_token: Some("hf_test".to_string()),
            ..Default::default()
        };
        assert!(config.inference_enabled());

        let local = MLConfig {
            inference_url: "http://localhost:8080".to_string(),
            ..Default::default()
        };
        assert!(local.inference_enabled());
    }

    #[test]
    fn test_http_classifiers_use_configured_models() {
        let set = MLConfig::default().http_classifiers().unwrap();
        assert_eq!(set.sentiment.model_name(), DEFAULT_SENTIMENT_MODEL);
        let authenticity = set.authenticity.unwrap();
        assert_eq!(authenticity.model_name(), DEFAULT_AUTHENTICITY_MODEL);
    }
}
