use analysis_core::{NewsItem, SentimentLabel};
use serde::{Deserialize, Serialize};

use crate::pipeline::aggregate_sentiment;

/// Score beyond which the overall mood is called positive or negative.
pub const OVERALL_LABEL_THRESHOLD: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OverallSentiment {
    Positive,
    Negative,
    Neutral,
}

impl OverallSentiment {
    pub fn from_score(score: f64) -> Self {
        if score > OVERALL_LABEL_THRESHOLD {
            OverallSentiment::Positive
        } else if score < -OVERALL_LABEL_THRESHOLD {
            OverallSentiment::Negative
        } else {
            OverallSentiment::Neutral
        }
    }
}

/// Ticker-level view of the classified news. Label counts and percentages
/// cover trusted articles only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentOverview {
    pub positive_count: usize,
    pub negative_count: usize,
    pub neutral_count: usize,
    pub positive_percent: f64,
    pub negative_percent: f64,
    pub neutral_percent: f64,
    pub verified_count: usize,
    pub suspicious_count: usize,
    pub total_analyzed: usize,
    pub overall_score: f64,
    pub overall_label: OverallSentiment,
}

impl SentimentOverview {
    pub fn from_items(items: &[NewsItem]) -> Self {
        let trusted: Vec<&NewsItem> = items.iter().filter(|i| i.is_trusted).collect();
        let count = |label: SentimentLabel| trusted.iter().filter(|i| i.label == label).count();

        let positive_count = count(SentimentLabel::Positive);
        let negative_count = count(SentimentLabel::Negative);
        let neutral_count = count(SentimentLabel::Neutral);

        let percent = |n: usize| {
            if trusted.is_empty() {
                0.0
            } else {
                n as f64 / trusted.len() as f64 * 100.0
            }
        };

        let overall_score = aggregate_sentiment(items);

        Self {
            positive_count,
            negative_count,
            neutral_count,
            positive_percent: percent(positive_count),
            negative_percent: percent(negative_count),
            neutral_percent: percent(neutral_count),
            verified_count: trusted.len(),
            suspicious_count: items.len() - trusted.len(),
            total_analyzed: items.len(),
            overall_score,
            overall_label: OverallSentiment::from_score(overall_score),
        }
    }
}
