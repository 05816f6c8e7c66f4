use analysis_core::{AnalysisError, NewsArticle, NewsProvider};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::rate_limit::{send_request, RateLimiter};

const BASE_URL: &str = "https://finnhub.io/api/v1";

/// Company news from Finnhub
#[derive(Clone)]
pub struct FinnhubClient {
    api_key: String,
    client: Client,
    rate_limiter: RateLimiter,
}

impl FinnhubClient {
    /// Free tier allows 60 calls per minute.
    pub fn new(api_key: String, requests_per_minute: usize, timeout: Duration) -> Result<Self, AnalysisError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        Ok(Self {
            api_key,
            client,
            rate_limiter: RateLimiter::per_minute(requests_per_minute),
        })
    }
}

#[derive(Debug, Deserialize)]
struct CompanyNewsItem {
    #[serde(default)]
    headline: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    source: String,
    #[serde(default)]
    url: String,
    /// Unix seconds
    datetime: i64,
    #[serde(default)]
    image: String,
}

pub fn parse_company_news(body: &str) -> Result<Vec<NewsArticle>, AnalysisError> {
    let items: Vec<CompanyNewsItem> =
        serde_json::from_str(body).map_err(|e| AnalysisError::ApiError(e.to_string()))?;

    Ok(items
        .into_iter()
        .filter(|item| !item.headline.is_empty())
        .filter_map(|item| {
            Some(NewsArticle {
                published_utc: DateTime::from_timestamp(item.datetime, 0)?,
                headline: item.headline,
                summary: item.summary,
                source: if item.source.is_empty() {
                    "Finnhub".to_string()
                } else {
                    item.source
                },
                url: if item.url.is_empty() { "#".to_string() } else { item.url },
                image: Some(item.image).filter(|i| !i.is_empty()),
            })
        })
        .collect())
}

#[async_trait]
impl NewsProvider for FinnhubClient {
    async fn company_news(
        &self,
        symbol: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<NewsArticle>, AnalysisError> {
        let url = format!("{}/company-news", BASE_URL);
        let from = from.format("%Y-%m-%d").to_string();
        let to = to.format("%Y-%m-%d").to_string();

        let response = send_request(
            &self.client,
            &self.rate_limiter,
            self.client.get(&url).query(&[
                ("symbol", symbol),
                ("from", from.as_str()),
                ("to", to.as_str()),
                ("token", self.api_key.as_str()),
            ]),
            "Finnhub",
        )
        .await?;

        if !response.status().is_success() {
            return Err(AnalysisError::ApiError(format!(
                "Finnhub HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AnalysisError::ApiError(e.to_string()))?;
        parse_company_news(&body)
    }

    fn name(&self) -> &'static str {
        "finnhub"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_company_news() {
        let body = json!([
            {
                "category": "company",
                "datetime": 1714573800,
                "headline": "Apple beats on services revenue",
                "id": 127001,
                "image": "https://img.example.com/a.jpg",
                "related": "AAPL",
                "source": "Reuters",
                "summary": "Services grew 14%.",
                "url": "https://example.com/a"
            },
            {
                "category": "company",
                "datetime": 1714487400,
                "headline": "",
                "id": 127002,
                "image": "",
                "related": "AAPL",
                "source": "Yahoo",
                "summary": "",
                "url": ""
            },
            {
                "category": "company",
                "datetime": 1714401000,
                "headline": "Supplier note",
                "id": 127003,
                "image": "",
                "related": "AAPL",
                "source": "",
                "summary": "Quiet quarter.",
                "url": ""
            }
        ])
        .to_string();

        let articles = parse_company_news(&body).unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].source, "Reuters");
        assert_eq!(articles[0].image.as_deref(), Some("https://img.example.com/a.jpg"));
        assert_eq!(articles[0].published_utc.to_rfc3339(), "2024-05-01T14:30:00+00:00");
        assert_eq!(articles[1].source, "Finnhub");
        assert_eq!(articles[1].url, "#");
        assert!(articles[1].image.is_none());
    }

    #[test]
    fn test_parse_error_body() {
        assert!(parse_company_news(r#"{"error": "Invalid API key"}"#).is_err());
        assert!(parse_company_news("[]").unwrap().is_empty());
    }
}
