use async_trait::async_trait;
use ml_client::{MLResult, SentimentClassifier, SentimentDistribution};
use std::collections::HashSet;

const POSITIVE_WORDS: &[&str] = &[
    "bullish", "rally", "surge", "gain", "gains", "profit", "growth", "beat", "beats",
    "upgrade", "outperform", "strong", "positive", "rise", "increase",
    "breakthrough", "innovation", "success", "exceed", "momentum",
    "buy", "recommend", "optimistic", "record", "high", "advance",
    // Financial-specific terms
    "dividend", "buyback", "repurchase", "accretive", "upside",
    "recovery", "rebound", "expansion", "robust", "accelerating",
    "overweight", "raised", "upgraded", "outpacing", "tailwind",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bearish", "decline", "loss", "fall", "plunge", "crash", "miss", "misses",
    "downgrade", "underperform", "weak", "negative", "drop", "decrease",
    "concern", "risk", "fail", "disappoint", "slump", "sell",
    "warning", "pessimistic", "low", "retreat", "fear", "trouble",
    // Financial-specific terms
    "dilution", "dilutive", "headwind", "lawsuit", "litigation",
    "recall", "investigation", "probe", "default", "bankruptcy",
    "restructuring", "layoff", "downside", "overvalued", "bubble",
    "underweight", "lowered", "suspended",
];

const NEGATION_WORDS: &[&str] = &[
    "not", "no", "never", "don't", "doesn't", "didn't", "isn't", "aren't",
    "wasn't", "weren't", "won't", "wouldn't", "couldn't", "shouldn't", "hardly",
    "barely", "neither", "nor", "without",
];

const NEGATION_WINDOW: usize = 3;

/// Word-list sentiment classifier used when no inference endpoint is configured.
pub struct LexiconSentiment {
    positive: HashSet<&'static str>,
    negative: HashSet<&'static str>,
    negation: HashSet<&'static str>,
}

impl LexiconSentiment {
    pub fn new() -> Self {
        Self {
            positive: POSITIVE_WORDS.iter().copied().collect(),
            negative: NEGATIVE_WORDS.iter().copied().collect(),
            negation: NEGATION_WORDS.iter().copied().collect(),
        }
    }

    /// Positive and negative hits, with polarity flipped for words that follow
    /// a negation within `NEGATION_WINDOW` words.
    fn count_hits(&self, text: &str) -> (usize, usize) {
        let text_lower = text.to_lowercase();
        let words: Vec<&str> = text_lower
            .split(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | '.' | '!' | '?' | ':' | '"'))
            .filter(|w| !w.is_empty())
            .collect();

        let negation_positions: Vec<usize> = words
            .iter()
            .enumerate()
            .filter(|(_, w)| self.negation.contains(*w))
            .map(|(i, _)| i)
            .collect();

        let mut positive = 0;
        let mut negative = 0;

        for (i, word) in words.iter().enumerate() {
            let is_positive = self.positive.contains(*word);
            let is_negative = self.negative.contains(*word);
            if !is_positive && !is_negative {
                continue;
            }

            let negated = negation_positions
                .iter()
                .any(|&neg_pos| neg_pos < i && (i - neg_pos) <= NEGATION_WINDOW);

            if is_positive != negated {
                positive += 1;
            } else {
                negative += 1;
            }
        }

        (positive, negative)
    }

    pub fn distribution(&self, text: &str) -> SentimentDistribution {
        let (positive, negative) = self.count_hits(text);
        if positive + negative == 0 {
            return SentimentDistribution::neutral();
        }

        // one pseudo-count of neutral keeps single-word hits away from +/-1
        let total = (positive + negative + 1) as f64;
        SentimentDistribution {
            positive: positive as f64 / total,
            negative: negative as f64 / total,
            neutral: 1.0 / total,
        }
    }
}

impl Default for LexiconSentiment {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SentimentClassifier for LexiconSentiment {
    async fn classify_batch(&self, texts: &[String]) -> MLResult<Vec<SentimentDistribution>> {
        Ok(texts.iter().map(|t| self.distribution(t)).collect())
    }

    fn model_name(&self) -> &str {
        "lexicon"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_headline() {
        let lexicon = LexiconSentiment::new();
        let dist = lexicon.distribution("Apple beats estimates as revenue growth accelerating");
        assert!(dist.score() > 0.5);
    }

    #[test]
    fn test_negative_headline() {
        let lexicon = LexiconSentiment::new();
        let dist = lexicon.distribution("Shares plunge after earnings miss and weak outlook");
        assert!(dist.score() < -0.5);
    }

    #[test]
    fn test_negation_flips_polarity() {
        let lexicon = LexiconSentiment::new();
        assert!(lexicon.distribution("The quarter was not strong").score() < 0.0);
        assert!(lexicon.distribution("No concern from regulators").score() > 0.0);
    }

    #[test]
    fn test_no_hits_is_neutral() {
        let lexicon = LexiconSentiment::new();
        let dist = lexicon.distribution("Company to hold annual meeting on Tuesday");
        assert_eq!(dist, SentimentDistribution::neutral());
    }

    #[tokio::test]
    async fn test_batch_preserves_order() {
        let lexicon = LexiconSentiment::new();
        let texts = vec!["strong rally".to_string(), "crash".to_string()];
        let dists = lexicon.classify_batch(&texts).await.unwrap();
        assert_eq!(dists.len(), 2);
        assert!(dists[0].score() > 0.0);
        assert!(dists[1].score() < 0.0);
    }
}
