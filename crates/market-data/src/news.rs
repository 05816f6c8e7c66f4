use analysis_core::{AnalysisError, NewsArticle, NewsProvider};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// News for a ticker from a primary source with an optional fallback.
///
/// Fetching never fails: provider errors and empty results fall through to the
/// next source, and with nothing left the feed is empty.
pub struct NewsFeed {
    primary: Option<Arc<dyn NewsProvider>>,
    fallback: Option<Arc<dyn NewsProvider>>,
    lookback: Duration,
    max_articles: usize,
}

impl NewsFeed {
    pub const DEFAULT_LOOKBACK_DAYS: i64 = 7;
    pub const DEFAULT_MAX_ARTICLES: usize = 10;

    pub fn new(
        primary: Option<Arc<dyn NewsProvider>>,
        fallback: Option<Arc<dyn NewsProvider>>,
    ) -> Self {
        Self {
            primary,
            fallback,
            lookback: Duration::days(Self::DEFAULT_LOOKBACK_DAYS),
            max_articles: Self::DEFAULT_MAX_ARTICLES,
        }
    }

    pub fn with_max_articles(mut self, max_articles: usize) -> Self {
        self.max_articles = max_articles;
        self
    }

    /// At most `max_articles` articles from the last week, newest first.
    pub async fn recent_news(&self, symbol: &str) -> Vec<NewsArticle> {
        self.recent_news_at(symbol, Utc::now()).await
    }

    pub async fn recent_news_at(&self, symbol: &str, now: DateTime<Utc>) -> Vec<NewsArticle> {
        let from = now - self.lookback;

        for provider in [&self.primary, &self.fallback].into_iter().flatten() {
            match provider.company_news(symbol, from, now).await {
                Ok(mut articles) if !articles.is_empty() => {
                    articles.sort_by(|a, b| b.published_utc.cmp(&a.published_utc));
                    articles.truncate(self.max_articles);
                    tracing::info!(
                        symbol,
                        source = provider.name(),
                        articles = articles.len(),
                        "Fetched news"
                    );
                    return articles;
                }
                Ok(_) => tracing::debug!(symbol, source = provider.name(), "News source returned nothing"),
                Err(e) => tracing::warn!(symbol, source = provider.name(), "News source failed: {}", e),
            }
        }

        tracing::warn!("{}", AnalysisError::NewsUnavailable(symbol.to_string()));
        vec![]
    }
}
