//! Symbol API Routes
//!
//! Ticker list backing the symbol picker.

use axum::{extract::State, routing::get, Json, Router};

use crate::{ApiResponse, AppState};

pub fn symbol_routes() -> Router<AppState> {
    Router::new().route("/api/symbols", get(list_symbols))
}

/// Featured indices, crypto and FX first, then the US listing (or a short
/// fallback list when the listing cannot be downloaded).
async fn list_symbols(State(state): State<AppState>) -> Json<ApiResponse<Vec<String>>> {
    Json(ApiResponse::success(state.tickers.symbols().await))
}
