use analysis_core::{AuthenticityLabel, NewsArticle, NewsItem, SentimentLabel};
use ml_client::{
    AuthenticityClassifier, AuthenticityVerdict, ClassifierSet, SentimentClassifier,
    SentimentDistribution,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Decision thresholds of the classification pipeline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrustThresholds {
    /// An article classified FAKE with confidence strictly above this is untrusted.
    pub fake_news: f64,
    /// Scores beyond +/- this value are labelled Positive / Negative.
    pub sentiment_label: f64,
}

impl Default for TrustThresholds {
    fn default() -> Self {
        Self {
            fake_news: 0.60,
            sentiment_label: 0.05,
        }
    }
}

pub fn is_trusted(verdict: &AuthenticityVerdict, fake_threshold: f64) -> bool {
    !(verdict.label == AuthenticityLabel::Fake && verdict.confidence > fake_threshold)
}

pub fn label_for_score(score: f64, threshold: f64) -> SentimentLabel {
    if score > threshold {
        SentimentLabel::Positive
    } else if score < -threshold {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    }
}

/// Mean sentiment score over trusted items, 0.0 when none are trusted.
pub fn aggregate_sentiment(items: &[NewsItem]) -> f64 {
    let trusted: Vec<f64> = items
        .iter()
        .filter(|item| item.is_trusted)
        .map(|item| item.sentiment_score)
        .collect();

    if trusted.is_empty() {
        0.0
    } else {
        trusted.iter().sum::<f64>() / trusted.len() as f64
    }
}

/// Turns raw articles into trust-flagged, sentiment-scored news items.
///
/// Classifier failures never abort the batch: a failed sentiment batch is
/// retried per article and articles that still fail are neutral; a failed
/// authenticity check leaves the article trusted.
pub struct NewsClassificationPipeline {
    sentiment: Arc<dyn SentimentClassifier>,
    authenticity: Option<Arc<dyn AuthenticityClassifier>>,
    thresholds: TrustThresholds,
}

impl NewsClassificationPipeline {
    pub fn new(
        sentiment: Arc<dyn SentimentClassifier>,
        authenticity: Option<Arc<dyn AuthenticityClassifier>>,
        thresholds: TrustThresholds,
    ) -> Self {
        Self {
            sentiment,
            authenticity,
            thresholds,
        }
    }

    pub fn from_classifiers(set: &ClassifierSet, thresholds: TrustThresholds) -> Self {
        Self::new(set.sentiment.clone(), set.authenticity.clone(), thresholds)
    }

    pub fn thresholds(&self) -> TrustThresholds {
        self.thresholds
    }

    pub async fn classify(&self, articles: &[NewsArticle]) -> Vec<NewsItem> {
        if articles.is_empty() {
            return vec![];
        }

        let texts: Vec<String> = articles.iter().map(|a| a.full_text()).collect();
        let distributions = self.score_sentiment(&texts).await;

        let mut items = Vec::with_capacity(articles.len());
        for ((article, text), dist) in articles.iter().zip(&texts).zip(distributions) {
            let (is_trusted, fake_confidence) = self.check_authenticity(text).await;
            let sentiment_score = dist.score().clamp(-1.0, 1.0);

            items.push(NewsItem {
                headline: article.headline.clone(),
                summary: article.summary.clone(),
                source: article.source.clone(),
                url: article.url.clone(),
                published_date: article.published_utc.date_naive(),
                image: article.image.clone(),
                is_trusted,
                fake_confidence,
                sentiment_score,
                label: label_for_score(sentiment_score, self.thresholds.sentiment_label),
            });
        }

        let suspicious = items.iter().filter(|i| !i.is_trusted).count();
        tracing::info!(
            articles = items.len(),
            suspicious,
            model = self.sentiment.model_name(),
            "Classified news batch"
        );
        items
    }

    async fn score_sentiment(&self, texts: &[String]) -> Vec<SentimentDistribution> {
        match self.sentiment.classify_batch(texts).await {
            Ok(dists) if dists.len() == texts.len() => return dists,
            Ok(dists) => tracing::warn!(
                expected = texts.len(),
                got = dists.len(),
                "Sentiment batch size mismatch, retrying per article"
            ),
            Err(e) => tracing::warn!("Sentiment batch failed, retrying per article: {}", e),
        }

        let mut dists = Vec::with_capacity(texts.len());
        for text in texts {
            let single = std::slice::from_ref(text);
            let dist = match self.sentiment.classify_batch(single).await {
                Ok(mut d) if d.len() == 1 => d.remove(0),
                Ok(d) => {
                    tracing::warn!(got = d.len(), "Sentiment returned no single result for article, scoring neutral");
                    SentimentDistribution::neutral()
                }
                Err(e) => {
                    tracing::warn!("Sentiment failed for article, scoring neutral: {}", e);
                    SentimentDistribution::neutral()
                }
            };
            dists.push(dist);
        }
        dists
    }

    /// Returns `(is_trusted, fake_confidence)`.
    async fn check_authenticity(&self, text: &str) -> (bool, f64) {
        let Some(classifier) = &self.authenticity else {
            return (true, 0.0);
        };

        match classifier.classify(text).await {
            Ok(verdict) => {
                let fake_confidence = match verdict.label {
                    AuthenticityLabel::Fake => verdict.confidence,
                    AuthenticityLabel::Real => 0.0,
                };
                (is_trusted(&verdict, self.thresholds.fake_news), fake_confidence)
            }
            Err(e) => {
                tracing::warn!("Authenticity check failed, treating article as trusted: {}", e);
                (true, 0.0)
            }
        }
    }
}
