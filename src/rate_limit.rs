use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use std::{collections::HashMap, net::SocketAddr, sync::Arc, time::Duration};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::AppError;
use crate::AppState;

/// How many requests one key may make per window.
#[derive(Debug, Clone, Copy)]
pub struct RateLimit {
    pub max_requests: u32,
    pub window: Duration,
}

impl RateLimit {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }
}

/// Fixed windows counted per key, held in process memory.
#[derive(Clone, Default)]
pub struct RateLimitState {
    windows: Arc<Mutex<HashMap<String, Window>>>,
}

struct Window {
    opened: Instant,
    used: u32,
}

impl RateLimitState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one request against `key`. `Err` carries the time until the
    /// current window closes.
    pub async fn check(&self, key: &str, limit: RateLimit) -> Result<u32, Duration> {
        let mut windows = self.windows.lock().await;
        let now = Instant::now();

        let window = windows.entry(key.to_string()).or_insert(Window {
            opened: now,
            used: 0,
        });
        if now.duration_since(window.opened) >= limit.window {
            window.opened = now;
            window.used = 0;
        }

        if window.used >= limit.max_requests {
            return Err(limit.window.saturating_sub(now.duration_since(window.opened)));
        }
        window.used += 1;
        Ok(limit.max_requests - window.used)
    }

    /// Forgets windows opened more than two window lengths ago.
    pub async fn cleanup(&self, window_secs: u64) -> usize {
        let stale_after = Duration::from_secs(window_secs * 2);
        let mut windows = self.windows.lock().await;
        let before = windows.len();
        windows.retain(|_, window| window.opened.elapsed() < stale_after);
        before - windows.len()
    }
}

/// Caps how many analyses one client IP can start per window.
pub async fn rate_limit_analysis(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip = addr.ip();
    let limit = RateLimit::new(
        state.config.analysis_rate_limit,
        state.config.analysis_rate_window_secs,
    );

    match state
        .rate_limiter
        .check(&format!("analysis:{ip}"), limit)
        .await
    {
        Ok(remaining) => {
            tracing::debug!(%ip, remaining, "Analysis start allowed");
            Ok(next.run(req).await)
        }
        Err(retry_after) => {
            tracing::warn!(%ip, retry_after_secs = retry_after.as_secs(), "Too many analysis starts");
            Err(AppError::RateLimited)
        }
    }
}
