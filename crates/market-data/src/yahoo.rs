use analysis_core::{
    logo_url, AnalysisError, Bar, CompanyProfile, HistoryPeriod, PriceProvider,
};
use async_trait::async_trait;
use chrono::DateTime;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;

const CHART_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";
const QUOTE_SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
const PROFILE_MODULES: &str = "assetProfile,price,summaryDetail,defaultKeyStatistics,financialData";

/// Daily history and company profile from Yahoo Finance
#[derive(Clone)]
pub struct YahooFinanceClient {
    client: Client,
}

impl YahooFinanceClient {
    pub fn new(timeout: Duration) -> Result<Self, AnalysisError> {
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .timeout(timeout)
            .build()
            .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        Ok(Self { client })
    }

    async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Option<Value>, AnalysisError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        // unknown symbols come back as 404 with an error body
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(AnalysisError::ApiError(format!(
                "Yahoo HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let json = response
            .json()
            .await
            .map_err(|e| AnalysisError::ApiError(e.to_string()))?;
        Ok(Some(json))
    }
}

#[async_trait]
impl PriceProvider for YahooFinanceClient {
    async fn daily_bars(&self, symbol: &str, period: HistoryPeriod) -> Result<Vec<Bar>, AnalysisError> {
        let url = format!("{}/{}", CHART_URL, symbol);
        let query = [("range", period.as_range()), ("interval", "1d"), ("events", "history")];

        let Some(json) = self.get_json(&url, &query).await? else {
            return Ok(vec![]);
        };
        let bars = parse_chart(&json)?;
        tracing::debug!(symbol, period = %period, bars = bars.len(), "Fetched daily bars");
        Ok(bars)
    }

    async fn company_profile(&self, symbol: &str) -> Result<CompanyProfile, AnalysisError> {
        let url = format!("{}/{}", QUOTE_SUMMARY_URL, symbol);
        let query = [("modules", PROFILE_MODULES)];

        match self.get_json(&url, &query).await? {
            Some(json) => parse_quote_summary(symbol, &json),
            None => Err(AnalysisError::data_unavailable(symbol, "no profile found")),
        }
    }
}

/// Parses a v8 chart payload into daily bars. Days with any missing field are
/// skipped; a payload with no result yields no bars.
pub fn parse_chart(json: &Value) -> Result<Vec<Bar>, AnalysisError> {
    let Some(chart) = json
        .get("chart")
        .and_then(|v| v.get("result"))
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
    else {
        if let Some(desc) = json
            .get("chart")
            .and_then(|v| v.get("error"))
            .and_then(|v| v.get("description"))
            .and_then(|v| v.as_str())
        {
            tracing::debug!("Yahoo chart error: {}", desc);
        }
        return Ok(vec![]);
    };

    let Some(timestamps) = chart.get("timestamp").and_then(|v| v.as_array()) else {
        return Ok(vec![]);
    };

    // dates are taken in the exchange's local time
    let gmt_offset = chart
        .get("meta")
        .and_then(|m| m.get("gmtoffset"))
        .and_then(|v| v.as_i64())
        .unwrap_or(0);

    let quote = chart
        .get("indicators")
        .and_then(|v| v.get("quote"))
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .ok_or_else(|| AnalysisError::ApiError("No quote data in chart response".to_string()))?;

    let opens = series(quote, "open")?;
    let highs = series(quote, "high")?;
    let lows = series(quote, "low")?;
    let closes = series(quote, "close")?;
    let volumes = series(quote, "volume")?;

    let value_at = |values: &Vec<Value>, i: usize| values.get(i).and_then(|v| v.as_f64());

    let mut bars = Vec::with_capacity(timestamps.len());
    for (i, ts) in timestamps.iter().enumerate() {
        let (Some(ts), Some(open), Some(high), Some(low), Some(close)) = (
            ts.as_i64(),
            value_at(opens, i),
            value_at(highs, i),
            value_at(lows, i),
            value_at(closes, i),
        ) else {
            continue;
        };
        let Some(date) = DateTime::from_timestamp(ts + gmt_offset, 0).map(|dt| dt.date_naive()) else {
            continue;
        };

        bars.push(Bar {
            date,
            open,
            high,
            low,
            close,
            volume: value_at(volumes, i).unwrap_or(0.0),
        });
    }

    Ok(bars)
}

fn series<'a>(quote: &'a Value, name: &str) -> Result<&'a Vec<Value>, AnalysisError> {
    quote
        .get(name)
        .and_then(|v| v.as_array())
        .ok_or_else(|| AnalysisError::ApiError(format!("No {} series in chart response", name)))
}

/// quoteSummary numbers are either plain or wrapped as `{"raw": .., "fmt": ..}`.
fn raw_f64(module: Option<&Value>, key: &str) -> Option<f64> {
    let value = module?.get(key)?;
    value
        .as_f64()
        .or_else(|| value.get("raw").and_then(|v| v.as_f64()))
}

fn text(module: Option<&Value>, key: &str) -> Option<String> {
    module?
        .get(key)?
        .as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub fn parse_quote_summary(symbol: &str, json: &Value) -> Result<CompanyProfile, AnalysisError> {
    let result = json
        .get("quoteSummary")
        .and_then(|v| v.get("result"))
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .ok_or_else(|| AnalysisError::data_unavailable(symbol, "no profile found"))?;

    let asset = result.get("assetProfile");
    let price = result.get("price");
    let detail = result.get("summaryDetail");
    let stats = result.get("defaultKeyStatistics");
    let financial = result.get("financialData");

    let website = text(asset, "website");
    let name = text(price, "longName")
        .or_else(|| text(price, "shortName"))
        .unwrap_or_else(|| symbol.to_string());

    Ok(CompanyProfile {
        symbol: symbol.to_string(),
        name,
        summary: text(asset, "longBusinessSummary"),
        sector: text(asset, "sector"),
        industry: text(asset, "industry"),
        logo_url: logo_url(symbol, website.as_deref()),
        website,
        market_cap: raw_f64(price, "marketCap").or_else(|| raw_f64(detail, "marketCap")),
        forward_pe: raw_f64(detail, "forwardPE").or_else(|| raw_f64(stats, "forwardPE")),
        trailing_pe: raw_f64(detail, "trailingPE"),
        peg_ratio: raw_f64(stats, "pegRatio"),
        price_to_book: raw_f64(stats, "priceToBook"),
        dividend_yield: raw_f64(detail, "dividendYield"),
        return_on_equity: raw_f64(financial, "returnOnEquity"),
        return_on_assets: raw_f64(financial, "returnOnAssets"),
        debt_to_equity: raw_f64(financial, "debtToEquity"),
        eps: raw_f64(stats, "trailingEps"),
    })
}
