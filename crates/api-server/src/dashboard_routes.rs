//! Dashboard API Routes
//!
//! Price history, indicators, company profile and classified news for one
//! ticker.

use analysis_core::{AnalysisError, HistoryPeriod};
use analysis_orchestrator::TickerAnalysis;
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::{ApiResponse, AppError, AppState};

#[derive(Deserialize)]
pub struct DashboardQuery {
    /// History period: 1y, 2y (default), 5y or max
    #[serde(default)]
    pub period: Option<String>,
}

pub fn dashboard_routes() -> Router<AppState> {
    Router::new().route("/api/dashboard/:symbol", get(get_dashboard))
}

pub(crate) fn parse_period(raw: Option<&str>) -> Result<HistoryPeriod, AnalysisError> {
    match raw {
        Some(period) => period.parse(),
        None => Ok(HistoryPeriod::default()),
    }
}

async fn get_dashboard(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<ApiResponse<TickerAnalysis>>, AppError> {
    let period = parse_period(query.period.as_deref())?;
    let analysis = state.orchestrator.analyze(&symbol, period).await?;
    Ok(Json(ApiResponse::success(analysis)))
}
