use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{AnalysisError, Bar, CompanyProfile, HistoryPeriod, NewsArticle};

/// Source of daily price history and company metadata
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Daily bars for `symbol` over `period`, oldest first. An empty vector
    /// means the provider has no data for the symbol.
    async fn daily_bars(&self, symbol: &str, period: HistoryPeriod) -> Result<Vec<Bar>, AnalysisError>;

    async fn company_profile(&self, symbol: &str) -> Result<CompanyProfile, AnalysisError>;
}

/// Source of company news
#[async_trait]
pub trait NewsProvider: Send + Sync {
    async fn company_news(
        &self,
        symbol: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<NewsArticle>, AnalysisError>;

    fn name(&self) -> &'static str;
}
