use anyhow::{Context, Result};
use ml_engine::ForecastConfig;
use sentiment_analysis::TrustThresholds;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

/// Server settings read from the environment (after `.env` is loaded)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub finnhub_api_key: Option<String>,
    pub polygon_api_key: Option<String>,
    /// Finnhub requests allowed per minute
    pub finnhub_rate_limit: usize,
    /// Polygon requests allowed per minute
    pub polygon_rate_limit: usize,
    pub provider_timeout: Duration,
    pub thresholds: TrustThresholds,
    pub forecast: ForecastConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Unset keys take their default;
    /// set but unparseable values are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = ForecastConfig::default();
        let thresholds = TrustThresholds {
            fake_news: parse_value(&lookup, "FAKE_NEWS_THRESHOLD", TrustThresholds::default().fake_news)?,
            sentiment_label: parse_value(
                &lookup,
                "SENTIMENT_LABEL_THRESHOLD",
                TrustThresholds::default().sentiment_label,
            )?,
        };

        let forecast = ForecastConfig {
            lookback: parse_value(&lookup, "FORECAST_LOOKBACK", defaults.lookback)?,
            epochs: parse_value(&lookup, "FORECAST_EPOCHS", defaults.epochs)?,
            batch_size: parse_value(&lookup, "FORECAST_BATCH_SIZE", defaults.batch_size)?,
            seed: lookup("FORECAST_SEED")
                .filter(|s| !s.is_empty())
                .map(|s| s.parse::<u64>())
                .transpose()
                .context("FORECAST_SEED must be an unsigned integer")?,
            ..defaults
        };
        forecast.validate().context("invalid forecast configuration")?;

        let port: u16 = parse_value(&lookup, "API_PORT", 3000)?;

        Ok(Self {
            port,
            finnhub_api_key: lookup("FINNHUB_API_KEY").filter(|k| !k.is_empty()),
            polygon_api_key: lookup("POLYGON_API_KEY").filter(|k| !k.is_empty()),
            finnhub_rate_limit: parse_value(&lookup, "FINNHUB_RATE_LIMIT", 60)?,
            polygon_rate_limit: parse_value(&lookup, "POLYGON_RATE_LIMIT", 5)?,
            provider_timeout: Duration::from_secs(parse_value(&lookup, "PROVIDER_TIMEOUT_SECS", 10)?),
            thresholds,
            forecast,
        })
    }
}

fn parse_value<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} has invalid value '{}': {}", key, raw, e)),
        None => Ok(default),
    }
}
