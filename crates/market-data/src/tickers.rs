use analysis_core::AnalysisError;
use reqwest::Client;
use std::time::Duration;
use tokio::sync::OnceCell;

pub const US_SYMBOLS_URL: &str =
    "https://raw.githubusercontent.com/rreichel3/US-Stock-Symbols/main/all/all_tickers.txt";

/// Indices, crypto and FX listed ahead of the stock symbols.
pub const FEATURED_SYMBOLS: &[&str] = &["^GSPC", "^DJI", "^IXIC", "BTC-USD", "ETH-USD", "INR=X"];

pub const FALLBACK_SYMBOLS: &[&str] = &["AAPL", "GOOGL", "MSFT", "TSLA"];

/// Selectable tickers, downloaded once and cached for the life of the process.
pub struct TickerDirectory {
    client: Client,
    url: String,
    symbols: OnceCell<Vec<String>>,
}

impl TickerDirectory {
    pub fn new(timeout: Duration) -> Result<Self, AnalysisError> {
        Self::with_url(US_SYMBOLS_URL.to_string(), timeout)
    }

    pub fn with_url(url: String, timeout: Duration) -> Result<Self, AnalysisError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        Ok(Self {
            client,
            url,
            symbols: OnceCell::new(),
        })
    }

    /// Featured symbols followed by the US listing. Falls back to a short
    /// fixed list when the download fails; failures are not cached.
    pub async fn symbols(&self) -> Vec<String> {
        match self.symbols.get_or_try_init(|| self.download()).await {
            Ok(symbols) => symbols.clone(),
            Err(e) => {
                tracing::warn!("Ticker list unavailable, using fallback: {}", e);
                FALLBACK_SYMBOLS.iter().map(|s| s.to_string()).collect()
            }
        }
    }

    async fn download(&self) -> Result<Vec<String>, AnalysisError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AnalysisError::ApiError(format!(
                "ticker list HTTP {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AnalysisError::ApiError(e.to_string()))?;
        let symbols = parse_symbol_list(&body);
        if symbols.len() == FEATURED_SYMBOLS.len() {
            return Err(AnalysisError::ApiError("ticker list is empty".to_string()));
        }

        tracing::info!(symbols = symbols.len(), "Loaded ticker directory");
        Ok(symbols)
    }
}

/// One symbol per line, prefixed with the featured symbols.
pub fn parse_symbol_list(body: &str) -> Vec<String> {
    FEATURED_SYMBOLS
        .iter()
        .map(|s| s.to_string())
        .chain(
            body.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string),
        )
        .collect()
}
