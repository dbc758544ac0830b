//! Per-client sliding-window rate limit, applied as axum middleware.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::errors::ApiError;
use crate::state::AppState;
use pagepool_types::PoolError;

struct ClientWindow {
    window_start: Instant,
    count: u32,
}

pub struct RateLimiter {
    windows: Mutex<HashMap<String, ClientWindow>>,
    limit: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            limit,
            window,
        }
    }

    fn check(&self, client_id: &str) -> bool {
        let mut windows = self.windows.lock().unwrap();
        let now = Instant::now();
        let entry = windows.entry(client_id.to_string()).or_insert_with(|| ClientWindow {
            window_start: now,
            count: 0,
        });

        if now.duration_since(entry.window_start) >= self.window {
            entry.window_start = now;
            entry.count = 0;
        }

        entry.count += 1;
        entry.count <= self.limit
    }
}

pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    let client_id = extract_client_id(&request).unwrap_or_else(|| "anonymous".to_string());

    if !state.rate_limiter.check(&client_id) {
        tracing::warn!(client_id, "rate limit exceeded");
        return Err(ApiError::from(PoolError::RateLimitExceeded).into_response());
    }

    Ok(next.run(request).await)
}

fn extract_client_id(request: &Request) -> Option<String> {
    for header in ["X-Client-Id", "X-API-Key"] {
        if let Some(value) = request.headers().get(header).and_then(|h| h.to_str().ok()) {
            return Some(value.to_string());
        }
    }
    if let Some(forwarded) = request
        .headers()
        .get("X-Forwarded-For")
        .and_then(|h| h.to_str().ok())
    {
        return Some(forwarded.split(',').next().unwrap_or(forwarded).trim().to_string());
    }
    request
        .headers()
        .get("X-Real-IP")
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_the_limit_then_rejects() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        assert!(limiter.check("a"));
        assert!(limiter.check("a"));
        assert!(!limiter.check("a"));
    }

    #[test]
    fn clients_are_tracked_independently() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        assert!(limiter.check("a"));
        assert!(limiter.check("b"));
    }

    #[test]
    fn window_resets_after_elapsed_duration() {
        let limiter = RateLimiter::new(1, Duration::from_millis(10));
        assert!(limiter.check("a"));
        std::thread::sleep(Duration::from_millis(20));
        assert!(limiter.check("a"));
    }
}
