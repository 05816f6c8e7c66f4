use analysis_core::{AnalysisError, NewsProvider};
use analysis_orchestrator::DashboardOrchestrator;
use axum::{
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use market_data::{FinnhubClient, NewsFeed, PolygonNewsClient, TickerDirectory, YahooFinanceClient};
use ml_client::{ClassifierRegistry, ClassifierSet, MLConfig};
use sentiment_analysis::{LexiconSentiment, NewsClassificationPipeline};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

pub mod config;
mod dashboard_routes;
mod forecast_routes;
mod symbol_routes;

#[cfg(test)]
mod routes_tests;

pub use config::ServerConfig;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<DashboardOrchestrator>,
    pub tickers: Arc<TickerDirectory>,
    pub classifiers: Arc<ClassifierSet>,
}

/// JSON envelope of every API response
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Handler error carrying the HTTP status to answer with.
///
/// Any error converts with `?`; `AnalysisError`s get the status of their
/// kind, everything else is a 500.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    error: anyhow::Error,
}

impl AppError {
    pub fn with_status(status: StatusCode, error: anyhow::Error) -> Self {
        Self { status, error }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

pub fn status_for(error: &AnalysisError) -> StatusCode {
    match error {
        AnalysisError::DataUnavailable { .. } => StatusCode::NOT_FOUND,
        AnalysisError::InsufficientData { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        AnalysisError::ModelNotTrained => StatusCode::CONFLICT,
        AnalysisError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        AnalysisError::Classifier(_)
        | AnalysisError::NewsUnavailable(_)
        | AnalysisError::ApiError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let error = err.into();
        let status = error
            .downcast_ref::<AnalysisError>()
            .map(status_for)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self { status, error }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("Request failed: {:#}", self.error);
        } else {
            tracing::debug!("Request rejected ({}): {}", self.status, self.error);
        }
        let body = ApiResponse::<()>::error(self.error.to_string());
        (self.status, Json(body)).into_response()
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health_check))
        .merge(symbol_routes::symbol_routes())
        .merge(dashboard_routes::dashboard_routes())
        .merge(forecast_routes::forecast_routes())
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
        .with_state(state)
}

async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Json<ApiResponse<serde_json::Value>> {
    Json(ApiResponse::success(serde_json::json!({
        "status": "ok",
        "service": "stockvision-api",
        "version": env!("CARGO_PKG_VERSION"),
        "sentiment_model": state.classifiers.sentiment.model_name(),
        "authenticity_model": state
            .classifiers
            .authenticity
            .as_ref()
            .map(|c| c.model_name().to_string()),
    })))
}

/// Installs the global tracing subscriber. `RUST_LOG` sets the filter
/// (default `info`); `RUST_LOG_FORMAT=json` switches to JSON lines.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("RUST_LOG_FORMAT")
        .map(|f| f.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let result = if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().try_init()
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).try_init()
    };
    if let Err(e) = result {
        eprintln!("tracing subscriber already installed: {}", e);
    }
}

fn load_classifiers(ml_config: &MLConfig) -> anyhow::Result<ClassifierSet> {
    if ml_config.inference_enabled() {
        tracing::info!(
            "Using hosted classifiers at {} ({}, {})",
            ml_config.inference_url,
            ml_config.sentiment_model,
            ml_config.authenticity_model
        );
        return Ok(ml_config.http_classifiers()?);
    }

    tracing::warn!("HF_API_TOKEN not set, using lexicon sentiment without authenticity checks");
    Ok(ClassifierSet {
        sentiment: Arc::new(LexiconSentiment::new()),
        authenticity: None,
    })
}

fn news_feed(config: &ServerConfig) -> anyhow::Result<NewsFeed> {
    let primary: Option<Arc<dyn NewsProvider>> = match &config.finnhub_api_key {
        Some(key) => Some(Arc::new(FinnhubClient::new(
            key.clone(),
            config.finnhub_rate_limit,
            config.provider_timeout,
        )?)),
        None => None,
    };
    let fallback: Option<Arc<dyn NewsProvider>> = match &config.polygon_api_key {
        Some(key) => Some(Arc::new(PolygonNewsClient::new(
            key.clone(),
            config.polygon_rate_limit,
            config.provider_timeout,
        )?)),
        None => None,
    };

    if primary.is_none() && fallback.is_none() {
        tracing::warn!("No news provider configured (FINNHUB_API_KEY / POLYGON_API_KEY), news will be empty");
    }
    Ok(NewsFeed::new(primary, fallback))
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env()?;
    let ml_config = MLConfig::from_env()?;

    let classifiers = ClassifierRegistry::init(load_classifiers(&ml_config)?);
    let pipeline = NewsClassificationPipeline::from_classifiers(&classifiers, config.thresholds);

    let prices = Arc::new(YahooFinanceClient::new(config.provider_timeout)?);
    let orchestrator = DashboardOrchestrator::new(prices, news_feed(&config)?, pipeline)
        .with_forecast_config(config.forecast.clone());

    let state = AppState {
        orchestrator: Arc::new(orchestrator),
        tickers: Arc::new(TickerDirectory::new(config.provider_timeout)?),
        classifiers,
    };

    let app = build_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("StockVision API listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if ClassifierRegistry::teardown() {
        tracing::info!("Classifiers released");
    }
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("Failed to listen for SIGTERM: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
