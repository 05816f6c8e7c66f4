//! Forecast API Routes
//!
//! Training the close-price forecaster and reading back its output.

use analysis_core::ForecastHorizon;
use analysis_orchestrator::ForecastResult;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::dashboard_routes::parse_period;
use crate::{ApiResponse, AppError, AppState};

#[derive(Deserialize)]
pub struct ForecastRequest {
    /// Days to forecast, 7 to 90 (default 30)
    #[serde(default = "default_days")]
    pub days: usize,
    #[serde(default)]
    pub period: Option<String>,
}

#[derive(Deserialize)]
pub struct ExtendRequest {
    #[serde(default = "default_days")]
    pub days: usize,
}

fn default_days() -> usize {
    ForecastHorizon::DEFAULT_DAYS
}

pub fn forecast_routes() -> Router<AppState> {
    Router::new()
        .route("/api/forecast/latest", get(get_latest_forecast))
        .route("/api/forecast/latest/extend", post(extend_latest_forecast))
        .route("/api/forecast/:symbol", post(run_forecast))
}

/// Trains a fresh model on the ticker's history and forecasts `days` ahead.
async fn run_forecast(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Json(request): Json<ForecastRequest>,
) -> Result<Json<ApiResponse<ForecastResult>>, AppError> {
    let horizon = ForecastHorizon::new(request.days)?;
    let period = parse_period(request.period.as_deref())?;

    let result = state
        .orchestrator
        .train_and_forecast(&symbol, period, horizon)
        .await?;
    Ok(Json(ApiResponse::success(result)))
}

async fn get_latest_forecast(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ForecastResult>>, AppError> {
    match state.orchestrator.latest_forecast().await {
        Some(result) => Ok(Json(ApiResponse::success(result))),
        None => Err(AppError::with_status(
            StatusCode::NOT_FOUND,
            anyhow::anyhow!("No forecast has been run yet"),
        )),
    }
}

/// Rolls the last trained model over a new horizon without retraining.
async fn extend_latest_forecast(
    State(state): State<AppState>,
    Json(request): Json<ExtendRequest>,
) -> Result<Json<ApiResponse<ForecastResult>>, AppError> {
    let horizon = ForecastHorizon::new(request.days)?;
    let result = state.orchestrator.extend_forecast(horizon).await?;
    Ok(Json(ApiResponse::success(result)))
}
