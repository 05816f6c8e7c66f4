use analysis_core::{
    AnalysisError, Bar, CompanyProfile, ForecastHorizon, HistoryPeriod, NewsArticle, NewsItem,
    PriceProvider,
};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use market_data::NewsFeed;
use ml_engine::{FeatureFrame, ForecastConfig, StockPredictor};
use sentiment_analysis::{NewsClassificationPipeline, SentimentOverview};
use serde::Serialize;
use std::sync::Arc;
use technical_analysis::{add_technical_indicators, IndicatorConfig, IndicatorRow, TechnicalSummary};
use tokio::sync::Mutex;

pub mod forecast;
pub use forecast::{ForecastDirection, ForecastResult};


/// Internal cache entry with timestamp
struct CacheEntry<T> {
    data: T,
    cached_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    fn is_fresh(&self) -> bool {
        (Utc::now() - self.cached_at).num_seconds() < CACHE_TTL_SECS
    }
}

const CACHE_TTL_SECS: i64 = 300; // 5 minutes

/// Everything the dashboard shows for a ticker
#[derive(Debug, Clone, Serialize)]
pub struct TickerAnalysis {
    pub symbol: String,
    pub period: HistoryPeriod,
    pub currency: String,
    pub profile: CompanyProfile,
    pub technical: TechnicalSummary,
    /// Indicator table with the warm-up rows removed
    pub indicators: Vec<IndicatorRow>,
    pub news: Vec<NewsItem>,
    pub sentiment: SentimentOverview,
    pub generated_at: DateTime<Utc>,
}

/// Most recent trained forecaster and what it produced
#[derive(Default)]
struct ForecastSession {
    predictor: Option<StockPredictor>,
    latest: Option<ForecastResult>,
}

/// Runs the dashboard pipelines: price history and indicators, news trust and
/// sentiment, and the on-demand forecaster.
pub struct DashboardOrchestrator {
    prices: Arc<dyn PriceProvider>,
    news: NewsFeed,
    classifier: NewsClassificationPipeline,
    indicator_config: IndicatorConfig,
    forecast_config: ForecastConfig,
    /// Bars per (symbol, period) (5-min TTL)
    bars_cache: DashMap<String, CacheEntry<Vec<Bar>>>,
    /// Raw articles per symbol (5-min TTL)
    news_cache: DashMap<String, CacheEntry<Vec<NewsArticle>>>,
    session: Mutex<ForecastSession>,
}

impl DashboardOrchestrator {
    pub fn new(
        prices: Arc<dyn PriceProvider>,
        news: NewsFeed,
        classifier: NewsClassificationPipeline,
    ) -> Self {
        Self {
            prices,
            news,
            classifier,
            indicator_config: IndicatorConfig::default(),
            forecast_config: ForecastConfig::default(),
            bars_cache: DashMap::new(),
            news_cache: DashMap::new(),
            session: Mutex::new(ForecastSession::default()),
        }
    }

    pub fn with_indicator_config(mut self, config: IndicatorConfig) -> Self {
        self.indicator_config = config;
        self
    }

    pub fn with_forecast_config(mut self, config: ForecastConfig) -> Self {
        self.forecast_config = config;
        self
    }

    pub fn forecast_config(&self) -> &ForecastConfig {
        &self.forecast_config
    }

    /// Loads price history, indicators, company profile and classified news
    /// for a ticker.
    pub async fn analyze(&self, symbol: &str, period: HistoryPeriod) -> Result<TickerAnalysis, AnalysisError> {
        let symbol = normalize_symbol(symbol)?;
        tracing::info!("Starting dashboard analysis for {} (period: {})", symbol, period);

        let (bars_result, profile, articles) = tokio::join!(
            self.get_bars(&symbol, period),
            self.get_profile(&symbol),
            self.get_news(&symbol),
        );
        let bars = bars_result?;

        let indicators = add_technical_indicators(&bars, &self.indicator_config);
        let technical = TechnicalSummary::from_rows(&symbol, &indicators).ok_or(
            AnalysisError::InsufficientData {
                required: self.indicator_config.warmup(),
                available: bars.len(),
            },
        )?;

        let news = self.classifier.classify(&articles).await;
        let sentiment = SentimentOverview::from_items(&news);

        tracing::info!(
            "Analysis for {}: {} bars, {} indicator rows, {} articles ({} suspicious), sentiment {:.3}",
            symbol,
            bars.len(),
            indicators.len(),
            news.len(),
            sentiment.suspicious_count,
            sentiment.overall_score
        );

        Ok(TickerAnalysis {
            currency: technical.currency.clone(),
            symbol,
            period,
            profile,
            technical,
            indicators,
            news,
            sentiment,
            generated_at: Utc::now(),
        })
    }

    /// Trains a fresh forecaster on the ticker's feature frame and rolls it
    /// forward over `horizon` days.
    ///
    /// Forecast requests are serialized; the trained model replaces the one
    /// from the previous request only when training succeeds.
    pub async fn train_and_forecast(
        &self,
        symbol: &str,
        period: HistoryPeriod,
        horizon: ForecastHorizon,
    ) -> Result<ForecastResult, AnalysisError> {
        let analysis = self.analyze(symbol, period).await?;
        let sentiment_score = analysis.sentiment.overall_score;
        let frame = FeatureFrame::from_indicators(&analysis.indicators, sentiment_score);

        let mut session = self.session.lock().await;
        tracing::info!(
            "Training forecaster for {} on {} rows, horizon {} days",
            analysis.symbol,
            frame.len(),
            horizon.days()
        );

        let days = horizon.days();
        let mut predictor = StockPredictor::new(self.forecast_config.clone());
        let (predictor, report, predictions, dates) = tokio::task::spawn_blocking(move || {
            let report = predictor.train(&frame)?;
            let predictions = predictor.predict_future(days)?;
            let dates = predictor.forecast_dates(days)?;
            Ok::<_, AnalysisError>((predictor, report, predictions, dates))
        })
        .await
        .map_err(|e| AnalysisError::ApiError(format!("forecast task failed: {}", e)))??;

        let result = ForecastResult::new(
            analysis.symbol,
            analysis.currency,
            analysis.technical.current_price,
            sentiment_score,
            dates,
            predictions,
            report,
        );
        tracing::info!(
            "Forecast for {}: {:.2} -> {:.2} ({:+.2}%)",
            result.symbol,
            result.current_price,
            result.final_price,
            result.percent_change
        );

        session.predictor = Some(predictor);
        session.latest = Some(result.clone());
        Ok(result)
    }

    /// Rolls the most recently trained model forward over a new horizon
    /// without retraining.
    pub async fn extend_forecast(&self, horizon: ForecastHorizon) -> Result<ForecastResult, AnalysisError> {
        let mut session = self.session.lock().await;
        let (predictor, latest) = match (&session.predictor, &session.latest) {
            (Some(predictor), Some(latest)) => (predictor.clone(), latest.clone()),
            _ => return Err(AnalysisError::ModelNotTrained),
        };

        let days = horizon.days();
        let (predictions, dates) = tokio::task::spawn_blocking(move || {
            Ok::<_, AnalysisError>((predictor.predict_future(days)?, predictor.forecast_dates(days)?))
        })
        .await
        .map_err(|e| AnalysisError::ApiError(format!("forecast task failed: {}", e)))??;

        let result = ForecastResult::new(
            latest.symbol,
            latest.currency,
            latest.current_price,
            latest.sentiment_score,
            dates,
            predictions,
            latest.training,
        );
        session.latest = Some(result.clone());
        Ok(result)
    }

    pub async fn latest_forecast(&self) -> Option<ForecastResult> {
        self.session.lock().await.latest.clone()
    }

    /// Daily bars for a ticker (cached, 5-min TTL). An empty history is
    /// reported as unavailable data.
    pub async fn get_bars(&self, symbol: &str, period: HistoryPeriod) -> Result<Vec<Bar>, AnalysisError> {
        let cache_key = format!("{}:{}", symbol, period);
        if let Some(entry) = self.bars_cache.get(&cache_key) {
            if entry.is_fresh() {
                return Ok(entry.data.clone());
            }
        }

        let bars = self.prices.daily_bars(symbol, period).await.map_err(|e| match e {
            AnalysisError::DataUnavailable { .. } => e,
            other => AnalysisError::data_unavailable(symbol, other.to_string()),
        })?;

        if bars.is_empty() {
            tracing::warn!("No price history for {} ({})", symbol, period);
            return Err(AnalysisError::data_unavailable(symbol, "no price history returned"));
        }

        self.bars_cache.insert(
            cache_key,
            CacheEntry {
                data: bars.clone(),
                cached_at: Utc::now(),
            },
        );
        Ok(bars)
    }

    async fn get_profile(&self, symbol: &str) -> CompanyProfile {
        match self.prices.company_profile(symbol).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!("Company profile unavailable for {}: {}", symbol, e);
                CompanyProfile::placeholder(symbol)
            }
        }
    }

    /// Recent articles for a ticker (cached, 5-min TTL). Empty results are
    /// not cached.
    async fn get_news(&self, symbol: &str) -> Vec<NewsArticle> {
        if let Some(entry) = self.news_cache.get(symbol) {
            if entry.is_fresh() {
                return entry.data.clone();
            }
        }

        let articles = self.news.recent_news(symbol).await;
        if !articles.is_empty() {
            self.news_cache.insert(
                symbol.to_string(),
                CacheEntry {
                    data: articles.clone(),
                    cached_at: Utc::now(),
                },
            );
        }
        articles
    }
}

fn normalize_symbol(symbol: &str) -> Result<String, AnalysisError> {
    let symbol = symbol.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(AnalysisError::InvalidInput("ticker symbol is empty".to_string()));
    }
    Ok(symbol)
}
