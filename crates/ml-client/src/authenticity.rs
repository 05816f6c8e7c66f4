use analysis_core::AuthenticityLabel;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{MLError, MLResult};
use crate::inference::{score_of, InferenceEndpoint, LabelScore};

/// Authenticity label with the probability of that label
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AuthenticityVerdict {
    pub label: AuthenticityLabel,
    pub confidence: f64,
}

impl AuthenticityVerdict {
    /// Picks the more probable class, fake on a tie. Index 0 is fake and
    /// index 1 is real when the model only reports `LABEL_n` names.
    pub fn from_label_scores(scores: &[LabelScore]) -> MLResult<Self> {
        if scores.is_empty() {
            return Err(MLError::InvalidResponse(
                "authenticity model returned no labels".to_string(),
            ));
        }

        let fake = score_of(scores, |l| l == "fake" || l == "label_0");
        let real = score_of(scores, |l| l == "real" || l == "label_1");

        Ok(if fake >= real {
            Self {
                label: AuthenticityLabel::Fake,
                confidence: fake,
            }
        } else {
            Self {
                label: AuthenticityLabel::Real,
                confidence: real,
            }
        })
    }
}

#[async_trait]
pub trait AuthenticityClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> MLResult<AuthenticityVerdict>;

    fn model_name(&self) -> &str;
}

/// Fake-news detector served over HTTP
#[derive(Clone)]
pub struct AuthenticityClient {
    endpoint: InferenceEndpoint,
}

impl AuthenticityClient {
    pub fn new(endpoint: InferenceEndpoint) -> Self {
        Self { endpoint }
    }
}

#[async_trait]
impl AuthenticityClassifier for AuthenticityClient {
    async fn classify(&self, text: &str) -> MLResult<AuthenticityVerdict> {
        let scores = self.endpoint.classify(&[text.to_string()]).await?;
        let row = scores
            .first()
            .ok_or_else(|| MLError::InvalidResponse("empty authenticity response".to_string()))?;
        AuthenticityVerdict::from_label_scores(row)
    }

    fn model_name(&self) -> &str {
        self.endpoint.model()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(pairs: &[(&str, f64)]) -> Vec<LabelScore> {
        pairs
            .iter()
            .map(|(label, score)| LabelScore {
                label: label.to_string(),
                score: *score,
            })
            .collect()
    }

    #[test]
    fn test_indexed_labels() {
        let verdict =
            AuthenticityVerdict::from_label_scores(&scores(&[("LABEL_0", 0.95), ("LABEL_1", 0.05)]))
                .unwrap();
        assert_eq!(verdict.label, AuthenticityLabel::Fake);
        assert_eq!(verdict.confidence, 0.95);
    }

    #[test]
    fn test_named_labels() {
        let verdict =
            AuthenticityVerdict::from_label_scores(&scores(&[("REAL", 0.8), ("FAKE", 0.2)])).unwrap();
        assert_eq!(verdict.label, AuthenticityLabel::Real);
        assert_eq!(verdict.confidence, 0.8);
    }

    #[test]
    fn test_tie_is_fake() {
        let verdict =
            AuthenticityVerdict::from_label_scores(&scores(&[("FAKE", 0.5), ("REAL", 0.5)])).unwrap();
        assert_eq!(verdict.label, AuthenticityLabel::Fake);
    }

    #[test]
    fn test_empty_scores() {
        assert!(AuthenticityVerdict::from_label_scores(&[]).is_err());
    }
}
