#[cfg(test)]
mod tests {
    use crate::pipeline::*;
    use crate::summary::*;
    use analysis_core::{AuthenticityLabel, NewsArticle, NewsItem, SentimentLabel};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use ml_client::{
        AuthenticityClassifier, AuthenticityVerdict, MLError, MLResult, SentimentClassifier,
        SentimentDistribution,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn article(headline: &str) -> NewsArticle {
        NewsArticle {
            headline: headline.to_string(),
            summary: "summary".to_string(),
            source: "Finnhub".to_string(),
            url: "https://example.com".to_string(),
            published_utc: Utc.with_ymd_and_hms(2024, 5, 1, 14, 30, 0).unwrap(),
            image: None,
        }
    }

    fn dist(positive: f64, negative: f64) -> SentimentDistribution {
        SentimentDistribution {
            positive,
            negative,
            neutral: 1.0 - positive - negative,
        }
    }

    // Scores by keyword in the text: "up" positive, "down" negative.
    // Fails whole batches when `fail_batches` and any text containing "broken".
    struct KeywordSentiment {
        fail_batches: bool,
        calls: AtomicUsize,
    }

    impl KeywordSentiment {
        fn new(fail_batches: bool) -> Self {
            Self {
                fail_batches,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SentimentClassifier for KeywordSentiment {
        async fn classify_batch(&self, texts: &[String]) -> MLResult<Vec<SentimentDistribution>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_batches && texts.len() > 1 {
                return Err(MLError::ServiceUnavailable("batch too large".into()));
            }
            texts
                .iter()
                .map(|t| {
                    if t.contains("broken") {
                        Err(MLError::InvalidResponse("unparseable".into()))
                    } else if t.contains("up") {
                        Ok(dist(0.8, 0.1))
                    } else if t.contains("down") {
                        Ok(dist(0.1, 0.7))
                    } else {
                        Ok(dist(0.02, 0.0))
                    }
                })
                .collect()
        }

        fn model_name(&self) -> &str {
            "keyword"
        }
    }

    // Verdict encoded in the headline: "fake:<confidence>" or real.
    struct HeadlineAuthenticity;

    #[async_trait]
    impl AuthenticityClassifier for HeadlineAuthenticity {
        async fn classify(&self, text: &str) -> MLResult<AuthenticityVerdict> {
            if text.contains("unreachable") {
                return Err(MLError::ServiceUnavailable("timeout".into()));
            }
            let fake = text
                .split_whitespace()
                .find_map(|w| w.strip_prefix("fake:"))
                .and_then(|c| c.trim_end_matches('.').parse::<f64>().ok());
            Ok(match fake {
                Some(confidence) => AuthenticityVerdict {
                    label: AuthenticityLabel::Fake,
                    confidence,
                },
                None => AuthenticityVerdict {
                    label: AuthenticityLabel::Real,
                    confidence: 0.9,
                },
            })
        }

        fn model_name(&self) -> &str {
            "headline"
        }
    }

    fn pipeline(sentiment: Arc<KeywordSentiment>) -> NewsClassificationPipeline {
        NewsClassificationPipeline::new(
            sentiment,
            Some(Arc::new(HeadlineAuthenticity)),
            TrustThresholds::default(),
        )
    }

    #[test]
    fn test_trust_boundary_is_strict() {
        let at = AuthenticityVerdict {
            label: AuthenticityLabel::Fake,
            confidence: 0.60,
        };
        let above = AuthenticityVerdict {
            label: AuthenticityLabel::Fake,
            confidence: 0.6001,
        };
        let real = AuthenticityVerdict {
            label: AuthenticityLabel::Real,
            confidence: 0.99,
        };
        assert!(is_trusted(&at, 0.60));
        assert!(!is_trusted(&above, 0.60));
        assert!(is_trusted(&real, 0.60));
    }

    #[test]
    fn test_label_thresholds() {
        assert_eq!(label_for_score(0.0501, 0.05), SentimentLabel::Positive);
        assert_eq!(label_for_score(0.05, 0.05), SentimentLabel::Neutral);
        assert_eq!(label_for_score(-0.05, 0.05), SentimentLabel::Neutral);
        assert_eq!(label_for_score(-0.06, 0.05), SentimentLabel::Negative);
    }

    #[test]
    fn test_aggregate_without_trusted_items_is_zero() {
        assert_eq!(aggregate_sentiment(&[]), 0.0);
    }

    #[tokio::test]
    async fn test_fake_article_excluded_from_aggregate() {
        let pipeline = pipeline(Arc::new(KeywordSentiment::new(false)));
        let articles = vec![
            article("Shares up on guidance"),
            article("Shares down fake:0.95 rumor"),
            article("Shares up again"),
        ];

        let items = pipeline.classify(&articles).await;
        assert_eq!(items.len(), 3);
        assert!(!items[1].is_trusted);
        assert_eq!(items[1].fake_confidence, 0.95);
        assert_eq!(items[0].fake_confidence, 0.0);

        let aggregate = aggregate_sentiment(&items);
        assert!((aggregate - 0.7).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_fake_boundary_end_to_end() {
        let pipeline = pipeline(Arc::new(KeywordSentiment::new(false)));
        let items = pipeline
            .classify(&[article("fake:0.60 up"), article("fake:0.6001 up")])
            .await;
        assert!(items[0].is_trusted);
        assert!(!items[1].is_trusted);
    }

    #[tokio::test]
    async fn test_all_untrusted_aggregate_is_zero() {
        let pipeline = pipeline(Arc::new(KeywordSentiment::new(false)));
        let items = pipeline
            .classify(&[article("up fake:0.9"), article("down fake:0.8")])
            .await;
        assert!(items.iter().all(|i| !i.is_trusted));
        assert_eq!(aggregate_sentiment(&items), 0.0);
    }

    #[tokio::test]
    async fn test_batch_failure_retries_per_article() {
        let sentiment = Arc::new(KeywordSentiment::new(true));
        let pipeline = pipeline(sentiment.clone());
        let items = pipeline
            .classify(&[article("up"), article("broken feed"), article("down")])
            .await;

        // one failed batch then one call per article
        assert_eq!(sentiment.calls.load(Ordering::SeqCst), 4);
        assert_eq!(items[0].label, SentimentLabel::Positive);
        assert_eq!(items[1].sentiment_score, 0.0);
        assert_eq!(items[1].label, SentimentLabel::Neutral);
        assert_eq!(items[2].label, SentimentLabel::Negative);
    }

    // Always answers with one distribution fewer than asked for
    struct ShortSentiment;

    #[async_trait]
    impl SentimentClassifier for ShortSentiment {
        async fn classify_batch(&self, texts: &[String]) -> MLResult<Vec<SentimentDistribution>> {
            Ok(vec![dist(0.9, 0.0); texts.len().saturating_sub(1)])
        }

        fn model_name(&self) -> &str {
            "short"
        }
    }

    #[tokio::test]
    async fn test_size_mismatch_scores_neutral() {
        let pipeline = NewsClassificationPipeline::new(
            Arc::new(ShortSentiment),
            None,
            TrustThresholds::default(),
        );
        let items = pipeline.classify(&[article("up"), article("up again")]).await;
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.sentiment_score == 0.0));
        assert!(items.iter().all(|i| i.label == SentimentLabel::Neutral));
    }

    #[tokio::test]
    async fn test_authenticity_failure_is_trusted() {
        let pipeline = pipeline(Arc::new(KeywordSentiment::new(false)));
        let items = pipeline.classify(&[article("up unreachable")]).await;
        assert!(items[0].is_trusted);
        assert_eq!(items[0].fake_confidence, 0.0);
    }

    #[tokio::test]
    async fn test_without_authenticity_model_all_trusted() {
        let pipeline = NewsClassificationPipeline::new(
            Arc::new(KeywordSentiment::new(false)),
            None,
            TrustThresholds::default(),
        );
        let items = pipeline.classify(&[article("down fake:0.99")]).await;
        assert!(items[0].is_trusted);
    }

    #[tokio::test]
    async fn test_item_fields() {
        let pipeline = pipeline(Arc::new(KeywordSentiment::new(false)));
        let items = pipeline.classify(&[article("flat day")]).await;
        let item = &items[0];
        assert_eq!(item.published_date.to_string(), "2024-05-01");
        assert!((item.sentiment_score - 0.02).abs() < 1e-12);
        assert_eq!(item.label, SentimentLabel::Neutral);
        assert!(pipeline.classify(&[]).await.is_empty());
    }

    fn item(score: f64, trusted: bool) -> NewsItem {
        NewsItem {
            headline: "h".into(),
            summary: "s".into(),
            source: "src".into(),
            url: "#".into(),
            published_date: chrono::NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            image: None,
            is_trusted: trusted,
            fake_confidence: if trusted { 0.0 } else { 0.9 },
            sentiment_score: score,
            label: label_for_score(score, 0.05),
        }
    }

    #[test]
    fn test_overview_counts_trusted_only() {
        let items = vec![
            item(0.5, true),
            item(0.3, true),
            item(-0.4, true),
            item(0.0, true),
            item(-0.9, false),
        ];
        let overview = SentimentOverview::from_items(&items);

        assert_eq!(overview.positive_count, 2);
        assert_eq!(overview.negative_count, 1);
        assert_eq!(overview.neutral_count, 1);
        assert_eq!(overview.positive_percent, 50.0);
        assert_eq!(overview.verified_count, 4);
        assert_eq!(overview.suspicious_count, 1);
        assert_eq!(overview.total_analyzed, 5);
        assert!((overview.overall_score - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_overall_label() {
        assert_eq!(OverallSentiment::from_score(0.11), OverallSentiment::Positive);
        assert_eq!(OverallSentiment::from_score(0.1), OverallSentiment::Neutral);
        assert_eq!(OverallSentiment::from_score(-0.2), OverallSentiment::Negative);

        let empty = SentimentOverview::from_items(&[]);
        assert_eq!(empty.overall_label, OverallSentiment::Neutral);
        assert_eq!(empty.positive_percent, 0.0);
    }
}
