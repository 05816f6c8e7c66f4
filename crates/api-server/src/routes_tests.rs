use crate::*;
use analysis_core::{Bar, CompanyProfile, HistoryPeriod, PriceProvider};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use chrono::{Duration, NaiveDate};
use ml_engine::ForecastConfig;
use serde_json::{json, Value};
use sentiment_analysis::TrustThresholds;
use tower::ServiceExt;

// 120 rising bars for any symbol except "NOPE" (none) and "SHORT" (40 bars)
struct SyntheticPrices;

#[async_trait]
impl PriceProvider for SyntheticPrices {
    async fn daily_bars(&self, symbol: &str, _period: HistoryPeriod) -> Result<Vec<Bar>, AnalysisError> {
        let days = match symbol {
            "NOPE" => 0,
            "SHORT" => 40,
            _ => 120,
        };
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        Ok((0..days)
            .map(|i| {
                let close = 50.0 + 0.5 * i as f64;
                Bar {
                    date: start + Duration::days(i as i64),
                    open: close - 0.2,
                    high: close + 0.5,
                    low: close - 0.5,
                    close,
                    volume: 500_000.0,
                }
            })
            .collect())
    }

    async fn company_profile(&self, symbol: &str) -> Result<CompanyProfile, AnalysisError> {
        Ok(CompanyProfile {
            name: format!("{} Corp", symbol),
            ..CompanyProfile::placeholder(symbol)
        })
    }
}

fn test_state() -> AppState {
    let classifiers = Arc::new(ClassifierSet {
        sentiment: Arc::new(LexiconSentiment::new()),
        authenticity: None,
    });
    let pipeline = NewsClassificationPipeline::from_classifiers(&classifiers, TrustThresholds::default());
    let orchestrator = DashboardOrchestrator::new(Arc::new(SyntheticPrices), NewsFeed::new(None, None), pipeline)
        .with_forecast_config(ForecastConfig {
            lookback: 10,
            epochs: 2,
            batch_size: 16,
            hidden_units: 4,
            seed: Some(11),
            ..Default::default()
        });

    // nothing listens on the discard port, so the listing falls back
    let tickers = TickerDirectory::with_url(
        "http://127.0.0.1:9/nasdaq_tickers.txt".to_string(),
        std::time::Duration::from_secs(2),
    )
    .unwrap();

    AppState {
        orchestrator: Arc::new(orchestrator),
        tickers: Arc::new(tickers),
        classifiers,
    }
}

async fn send(state: &AppState, request: Request<Body>) -> (StatusCode, Value) {
    let response = build_router(state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(&test_state(), get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["sentiment_model"], "lexicon");
    assert!(body["data"]["authenticity_model"].is_null());
}

#[tokio::test]
async fn test_symbols_fall_back() {
    let (status, body) = send(&test_state(), get("/api/symbols")).await;
    assert_eq!(status, StatusCode::OK);
    let symbols: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|s| s.as_str())
        .collect();
    assert_eq!(symbols, vec!["AAPL", "GOOGL", "MSFT", "TSLA"]);
}

#[tokio::test]
async fn test_dashboard() {
    let (status, body) = send(&test_state(), get("/api/dashboard/msft?period=1y")).await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["symbol"], "MSFT");
    assert_eq!(data["period"], "1y");
    assert_eq!(data["profile"]["name"], "MSFT Corp");
    assert_eq!(data["indicators"].as_array().unwrap().len(), 87);
    assert_eq!(data["technical"]["current_price"], 109.5);
    assert_eq!(data["sentiment"]["overall_label"], "NEUTRAL");
    assert!(body["error"].is_null());
}

#[tokio::test]
async fn test_dashboard_unknown_period() {
    let (status, body) = send(&test_state(), get("/api/dashboard/MSFT?period=3y")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("unknown history period"));
}

#[tokio::test]
async fn test_dashboard_without_data() {
    let (status, body) = send(&test_state(), get("/api/dashboard/NOPE")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn test_forecast_horizon_out_of_range() {
    let state = test_state();
    let (status, _) = send(&state, post("/api/forecast/MSFT", json!({ "days": 5 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&state, post("/api/forecast/MSFT", json!({ "days": 91 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_forecast_on_short_history() {
    let (status, body) = send(&test_state(), post("/api/forecast/SHORT", json!({ "days": 7 }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("Insufficient data"));
}

#[tokio::test]
async fn test_latest_before_any_forecast() {
    let state = test_state();
    let (status, _) = send(&state, get("/api/forecast/latest")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&state, post("/api/forecast/latest/extend", json!({ "days": 10 }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_forecast_flow() {
    let state = test_state();
    let (status, body) = send(
        &state,
        post("/api/forecast/msft", json!({ "days": 7, "period": "2y" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["symbol"], "MSFT");
    assert_eq!(data["predictions"].as_array().unwrap().len(), 7);
    assert_eq!(data["dates"][0], "2024-04-30");
    assert_eq!(data["current_price"], 109.5);
    assert!(data["direction"] == "up" || data["direction"] == "down");

    let (status, latest) = send(&state, get("/api/forecast/latest")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(latest["data"]["predictions"], data["predictions"]);

    let (status, extended) = send(&state, post("/api/forecast/latest/extend", json!({ "days": 30 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(extended["data"]["predictions"].as_array().unwrap().len(), 30);
}

#[tokio::test]
async fn test_forecast_defaults_to_thirty_days() {
    let (status, body) = send(&test_state(), post("/api/forecast/MSFT", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["predictions"].as_array().unwrap().len(), 30);
}

#[test]
fn test_error_status_mapping() {
    assert_eq!(
        status_for(&AnalysisError::data_unavailable("X", "gone")),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        status_for(&AnalysisError::InsufficientData {
            required: 60,
            available: 10
        }),
        StatusCode::UNPROCESSABLE_ENTITY
    );
    assert_eq!(status_for(&AnalysisError::ModelNotTrained), StatusCode::CONFLICT);
    assert_eq!(
        status_for(&AnalysisError::InvalidInput("bad".into())),
        StatusCode::BAD_REQUEST
    );

    let from_analysis: AppError = AnalysisError::ModelNotTrained.into();
    assert_eq!(from_analysis.status(), StatusCode::CONFLICT);
    let other: AppError = anyhow::anyhow!("boom").into();
    assert_eq!(other.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
