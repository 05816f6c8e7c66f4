use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use crate::error::{MLError, MLResult};

/// Inputs longer than this are cut before they are sent; the hosted models
/// truncate at 512 tokens anyway.
const MAX_INPUT_CHARS: usize = 2000;

/// One `{label, score}` pair of a text-classification response
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

/// Hosted text-classification model speaking the Hugging Face inference contract:
/// `POST {base_url}/models/{model}` with `{"inputs": ...}`.
#[derive(Clone)]
pub struct InferenceEndpoint {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_token: Option<String>,
}

impl InferenceEndpoint {
    pub fn new(
        base_url: String,
        model: String,
        api_token: Option<String>,
        timeout: Duration,
    ) -> MLResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            api_token,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Classify `texts` and return one score list per input, in input order.
    pub async fn classify(&self, texts: &[String]) -> MLResult<Vec<Vec<LabelScore>>> {
        let inputs: Vec<String> = texts.iter().map(|t| clip(t)).collect();
        let body = json!({
            "inputs": inputs,
            "options": { "wait_for_model": true },
        });

        let mut request = self
            .client
            .post(format!("{}/models/{}", self.base_url, self.model))
            .json(&body);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!(model = %self.model, %status, "Inference request failed");
            return Err(MLError::ServiceUnavailable(format!(
                "{} returned {}: {}",
                self.model, status, detail
            )));
        }

        let payload: Value = response.json().await?;
        let scores = parse_label_scores(&payload)?;
        if scores.len() != texts.len() {
            return Err(MLError::InvalidResponse(format!(
                "expected {} results from {}, got {}",
                texts.len(),
                self.model,
                scores.len()
            )));
        }
        Ok(scores)
    }
}

fn clip(text: &str) -> String {
    text.chars().take(MAX_INPUT_CHARS).collect()
}

/// Normalizes a classification payload into one score list per input.
///
/// Accepts the batched form `[[{label, score}, ...], ...]` and the flat
/// single-input form `[{label, score}, ...]`.
pub fn parse_label_scores(payload: &Value) -> MLResult<Vec<Vec<LabelScore>>> {
    if let Some(error) = payload.get("error").and_then(|e| e.as_str()) {
        return Err(MLError::ServiceUnavailable(error.to_string()));
    }

    let outer = payload
        .as_array()
        .ok_or_else(|| MLError::InvalidResponse("expected a JSON array".to_string()))?;

    let nested = outer.iter().all(|v| v.is_array());
    if nested {
        outer
            .iter()
            .map(|row| serde_json::from_value(row.clone()).map_err(MLError::from))
            .collect()
    } else {
        let row: Vec<LabelScore> = serde_json::from_value(payload.clone())?;
        Ok(vec![row])
    }
}

/// Score for the first label accepted by `matches`, or 0.0 when absent.
pub fn score_of(scores: &[LabelScore], matches: impl Fn(&str) -> bool) -> f64 {
    scores
        .iter()
        .find(|s| matches(&s.label.to_lowercase()))
        .map(|s| s.score)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_batched_payload() {
        let payload = json!([
            [{"label": "positive", "score": 0.8}, {"label": "neutral", "score": 0.15}, {"label": "negative", "score": 0.05}],
            [{"label": "negative", "score": 0.7}, {"label": "neutral", "score": 0.2}, {"label": "positive", "score": 0.1}]
        ]);
        let parsed = parse_label_scores(&payload).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1][0].label, "negative");
    }

    #[test]
    fn test_parse_flat_payload() {
        let payload = json!([{"label": "LABEL_1", "score": 0.9}, {"label": "LABEL_0", "score": 0.1}]);
        let parsed = parse_label_scores(&payload).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(score_of(&parsed[0], |l| l == "label_0"), 0.1);
    }

    #[test]
    fn test_parse_error_payload() {
        let payload = json!({"error": "Model is currently loading", "estimated_time": 20.0});
        assert!(matches!(
            parse_label_scores(&payload),
            Err(MLError::ServiceUnavailable(_))
        ));
        assert!(parse_label_scores(&json!({"foo": 1})).is_err());
    }

    #[test]
    fn test_clip_long_input() {
        let long = "a".repeat(MAX_INPUT_CHARS + 50);
        assert_eq!(clip(&long).len(), MAX_INPUT_CHARS);
    }
}
