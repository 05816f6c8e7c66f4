use analysis_core::{AnalysisError, NewsArticle, NewsProvider};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::rate_limit::{send_request, RateLimiter};

const BASE_URL: &str = "https://api.polygon.io";

/// Reference news from Polygon, used when the primary source has nothing
#[derive(Clone)]
pub struct PolygonNewsClient {
    api_key: String,
    client: Client,
    rate_limiter: RateLimiter,
    limit: usize,
}

impl PolygonNewsClient {
    /// Free tier allows 5 calls per minute.
    pub fn new(api_key: String, requests_per_minute: usize, timeout: Duration) -> Result<Self, AnalysisError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        Ok(Self {
            api_key,
            client,
            rate_limiter: RateLimiter::per_minute(requests_per_minute),
            limit: 10,
        })
    }
}

#[derive(Debug, Deserialize)]
struct NewsResponse {
    #[serde(default)]
    results: Vec<NewsResult>,
}

#[derive(Debug, Deserialize)]
struct Publisher {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NewsResult {
    title: String,
    published_utc: String,
    article_url: String,
    description: Option<String>,
    image_url: Option<String>,
    publisher: Option<Publisher>,
}

pub fn parse_reference_news(body: &str) -> Result<Vec<NewsArticle>, AnalysisError> {
    let news_response: NewsResponse =
        serde_json::from_str(body).map_err(|e| AnalysisError::ApiError(e.to_string()))?;

    Ok(news_response
        .results
        .into_iter()
        .filter_map(|r| {
            let published_utc = DateTime::parse_from_rfc3339(&r.published_utc)
                .ok()?
                .with_timezone(&Utc);
            Some(NewsArticle {
                headline: r.title,
                summary: r.description.unwrap_or_default(),
                source: r
                    .publisher
                    .and_then(|p| p.name)
                    .unwrap_or_else(|| "Polygon".to_string()),
                url: r.article_url,
                published_utc,
                image: r.image_url,
            })
        })
        .collect())
}

#[async_trait]
impl NewsProvider for PolygonNewsClient {
    async fn company_news(
        &self,
        symbol: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<NewsArticle>, AnalysisError> {
        let url = format!("{}/v2/reference/news", BASE_URL);
        let query = vec![
            ("ticker", symbol.to_string()),
            ("published_utc.gte", from.format("%Y-%m-%d").to_string()),
            ("published_utc.lte", to.format("%Y-%m-%d").to_string()),
            ("order", "desc".to_string()),
            ("limit", self.limit.to_string()),
            ("apiKey", self.api_key.clone()),
        ];

        let response = send_request(
            &self.client,
            &self.rate_limiter,
            self.client.get(&url).query(&query),
            "Polygon",
        )
        .await?;

        if !response.status().is_success() {
            return Err(AnalysisError::ApiError(format!(
                "Polygon HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AnalysisError::ApiError(e.to_string()))?;
        parse_reference_news(&body)
    }

    fn name(&self) -> &'static str {
        "polygon"
    }
}
