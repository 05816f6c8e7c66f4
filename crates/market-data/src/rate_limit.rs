use analysis_core::AnalysisError;
use reqwest::{Client, RequestBuilder, Response};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Sliding-window rate limiter: at most `max_requests` per `window` duration.
#[derive(Clone)]
pub(crate) struct RateLimiter {
    timestamps: Arc<Mutex<VecDeque<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    pub(crate) fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: Arc::new(Mutex::new(VecDeque::new())),
            max_requests: max_requests.max(1),
            window,
        }
    }

    pub(crate) fn per_minute(max_requests: usize) -> Self {
        Self::new(max_requests, Duration::from_secs(60))
    }

    pub(crate) async fn acquire(&self) {
        loop {
            let mut ts = self.timestamps.lock().await;
            let now = Instant::now();

            while let Some(&front) = ts.front() {
                if now.duration_since(front) >= self.window {
                    ts.pop_front();
                } else {
                    break;
                }
            }

            let oldest = match ts.front() {
                Some(&oldest) if ts.len() >= self.max_requests => oldest,
                _ => {
                    ts.push_back(now);
                    return;
                }
            };

            // wait until the oldest request falls out of the window
            let sleep_dur = (oldest + self.window).duration_since(now) + Duration::from_millis(50);
            drop(ts);
            tracing::debug!("Rate limiter: waiting {:.1}s for a request slot", sleep_dur.as_secs_f64());
            tokio::time::sleep(sleep_dur).await;
        }
    }
}

/// Send a request through `limiter` with automatic 429 retry.
pub(crate) async fn send_request(
    client: &Client,
    limiter: &RateLimiter,
    builder: RequestBuilder,
    provider: &str,
) -> Result<Response, AnalysisError> {
    let request = builder.build().map_err(|e| AnalysisError::ApiError(e.to_string()))?;

    for attempt in 0..3u32 {
        limiter.acquire().await;
        let req_clone = request
            .try_clone()
            .ok_or_else(|| AnalysisError::ApiError("Cannot clone request".to_string()))?;
        let response = client
            .execute(req_clone)
            .await
            .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        if response.status().as_u16() != 429 {
            return Ok(response);
        }

        let wait_secs = 15u64;
        tracing::warn!(
            "{} 429 rate limited, waiting {}s before retry {}/3",
            provider,
            wait_secs,
            attempt + 1
        );
        tokio::time::sleep(Duration::from_secs(wait_secs)).await;
    }

    Err(AnalysisError::ApiError(format!(
        "Rate limited by {} after 3 retries",
        provider
    )))
}
