use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::MLResult;
use crate::inference::{score_of, InferenceEndpoint, LabelScore};

/// Class probabilities produced by a three-way financial sentiment model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentDistribution {
    pub positive: f64,
    pub negative: f64,
    pub neutral: f64,
}

impl SentimentDistribution {
    pub fn neutral() -> Self {
        Self {
            positive: 0.0,
            negative: 0.0,
            neutral: 1.0,
        }
    }

    /// Net sentiment in [-1, 1].
    pub fn score(&self) -> f64 {
        self.positive - self.negative
    }

    /// Maps label names to classes. Unnamed `LABEL_n` outputs follow the
    /// FinBERT order: 0 positive, 1 negative, 2 neutral.
    pub fn from_label_scores(scores: &[LabelScore]) -> Self {
        Self {
            positive: score_of(scores, |l| l == "positive" || l == "label_0"),
            negative: score_of(scores, |l| l == "negative" || l == "label_1"),
            neutral: score_of(scores, |l| l == "neutral" || l == "label_2"),
        }
    }
}

#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    /// Classify a batch of texts. The result has one distribution per text,
    /// in input order.
    async fn classify_batch(&self, texts: &[String]) -> MLResult<Vec<SentimentDistribution>>;

    fn model_name(&self) -> &str;
}

/// FinBERT-style sentiment model served over HTTP
#[derive(Clone)]
pub struct SentimentClient {
    endpoint: InferenceEndpoint,
}

impl SentimentClient {
    pub fn new(endpoint: InferenceEndpoint) -> Self {
        Self { endpoint }
    }
}

#[async_trait]
impl SentimentClassifier for SentimentClient {
    async fn classify_batch(&self, texts: &[String]) -> MLResult<Vec<SentimentDistribution>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let scores = self.endpoint.classify(texts).await?;
        Ok(scores
            .iter()
            .map(|row| SentimentDistribution::from_label_scores(row))
            .collect())
    }

    fn model_name(&self) -> &str {
        self.endpoint.model()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::parse_label_scores;
    use serde_json::json;

    #[test]
    fn test_distribution_from_named_labels() {
        let payload = json!([[
            {"label": "positive", "score": 0.7},
            {"label": "neutral", "score": 0.2},
            {"label": "negative", "score": 0.1}
        ]]);
        let rows = parse_label_scores(&payload).unwrap();
        let dist = SentimentDistribution::from_label_scores(&rows[0]);
        assert_eq!(dist.positive, 0.7);
        assert_eq!(dist.neutral, 0.2);
        assert!((dist.score() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_distribution_from_indexed_labels() {
        let payload = json!([
            {"label": "LABEL_0", "score": 0.1},
            {"label": "LABEL_1", "score": 0.6},
            {"label": "LABEL_2", "score": 0.3}
        ]);
        let rows = parse_label_scores(&payload).unwrap();
        let dist = SentimentDistribution::from_label_scores(&rows[0]);
        assert_eq!(dist.negative, 0.6);
        assert!((dist.score() + 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_neutral_distribution() {
        assert_eq!(SentimentDistribution::neutral().score(), 0.0);
    }
}
