use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::AnalysisError;

/// Daily OHLCV bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Company metadata shown next to the price chart
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub symbol: String,
    pub name: String,
    pub summary: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub website: Option<String>,
    pub logo_url: String,
    pub market_cap: Option<f64>,
    pub forward_pe: Option<f64>,
    pub trailing_pe: Option<f64>,
    pub peg_ratio: Option<f64>,
    pub price_to_book: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub return_on_equity: Option<f64>,
    pub return_on_assets: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub eps: Option<f64>,
}

impl CompanyProfile {
    /// Profile used when the provider has nothing for the symbol.
    pub fn placeholder(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            logo_url: logo_url(symbol, None),
            ..Default::default()
        }
    }
}

/// High-resolution logo for a company: the website favicon when a website is
/// known, otherwise a generated avatar with the ticker.
pub fn logo_url(symbol: &str, website: Option<&str>) -> String {
    match website {
        Some(site) if !site.is_empty() => format!(
            "https://t3.gstatic.com/faviconV2?client=SOCIAL&type=FAVICON&fallback_opts=TYPE,SIZE,URL&url={}&size=256",
            site
        ),
        _ => format!(
            "https://ui-avatars.com/api/?name={}&background=random&size=256&bold=true",
            symbol
        ),
    }
}

/// Raw article as returned by a news provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsArticle {
    pub headline: String,
    pub summary: String,
    pub source: String,
    pub url: String,
    pub published_utc: DateTime<Utc>,
    #[serde(default)]
    pub image: Option<String>,
}

impl NewsArticle {
    /// Text handed to the classifiers.
    pub fn full_text(&self) -> String {
        format!("{}. {}", self.headline, self.summary)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "Positive",
            SentimentLabel::Negative => "Negative",
            SentimentLabel::Neutral => "Neutral",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuthenticityLabel {
    Real,
    Fake,
}

/// Article after authenticity and sentiment classification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
    pub headline: String,
    pub summary: String,
    pub source: String,
    pub url: String,
    pub published_date: NaiveDate,
    pub image: Option<String>,
    pub is_trusted: bool,
    /// Classifier confidence that the article is fake (0.0 when classified REAL).
    pub fake_confidence: f64,
    pub sentiment_score: f64,
    pub label: SentimentLabel,
}

/// How much price history to load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HistoryPeriod {
    #[serde(rename = "1y")]
    OneYear,
    #[default]
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "5y")]
    FiveYears,
    #[serde(rename = "max")]
    Max,
}

impl HistoryPeriod {
    /// Range parameter understood by the market-data provider.
    pub fn as_range(&self) -> &'static str {
        match self {
            HistoryPeriod::OneYear => "1y",
            HistoryPeriod::TwoYears => "2y",
            HistoryPeriod::FiveYears => "5y",
            HistoryPeriod::Max => "max",
        }
    }
}

impl fmt::Display for HistoryPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_range())
    }
}

impl FromStr for HistoryPeriod {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1y" => Ok(HistoryPeriod::OneYear),
            "2y" => Ok(HistoryPeriod::TwoYears),
            "5y" => Ok(HistoryPeriod::FiveYears),
            "max" => Ok(HistoryPeriod::Max),
            other => Err(AnalysisError::InvalidInput(format!(
                "unknown history period '{}', expected one of 1y, 2y, 5y, max",
                other
            ))),
        }
    }
}

/// Number of calendar days to forecast, bounded to the range the dashboard offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ForecastHorizon(usize);

impl ForecastHorizon {
    pub const MIN_DAYS: usize = 7;
    pub const MAX_DAYS: usize = 90;
    pub const DEFAULT_DAYS: usize = 30;

    pub fn new(days: usize) -> Result<Self, AnalysisError> {
        if !(Self::MIN_DAYS..=Self::MAX_DAYS).contains(&days) {
            return Err(AnalysisError::InvalidInput(format!(
                "forecast horizon must be between {} and {} days, got {}",
                Self::MIN_DAYS,
                Self::MAX_DAYS,
                days
            )));
        }
        Ok(Self(days))
    }

    pub fn days(&self) -> usize {
        self.0
    }
}

impl Default for ForecastHorizon {
    fn default() -> Self {
        Self(Self::DEFAULT_DAYS)
    }
}

/// Currency symbol used when displaying prices for a ticker.
pub fn currency_symbol(symbol: &str) -> &'static str {
    if symbol.ends_with(".NS")
        || symbol.ends_with(".BO")
        || matches!(symbol, "^NSEI" | "^BSESN" | "INR=X")
    {
        "₹"
    } else {
        "$"
    }
}
