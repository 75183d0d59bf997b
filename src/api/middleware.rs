//! API Middleware (Auth, Rate Limiting, Logging)

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::handlers::AppState;
use super::types::TableFailure;
use crate::models::{AppError, ErrorCode};

/// Paths reachable without an API key and outside the rate limit
const OPEN_PATHS: [&str; 2] = ["/", "/health"];

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Requests per window
    pub requests_per_window: u32,
    /// Window duration
    pub window_duration: Duration,
}

impl RateLimitConfig {
    pub fn per_minute(requests: u32) -> Self {
        Self {
            requests_per_window: requests,
            window_duration: Duration::from_secs(60),
        }
    }
}

/// Fixed-window limiter keyed by API key or client address
pub struct RateLimiter {
    requests: DashMap<String, (u32, Instant)>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            requests: DashMap::new(),
            config,
        }
    }

    /// Check if request is allowed, returns (allowed, remaining, reset_seconds)
    pub fn check(&self, key: &str) -> (bool, u32, u64) {
        let now = Instant::now();

        let mut entry = self.requests.entry(key.to_string()).or_insert((0, now));

        if now.duration_since(entry.1) > self.config.window_duration {
            entry.0 = 0;
            entry.1 = now;
        }

        let reset_secs = self
            .config
            .window_duration
            .saturating_sub(now.duration_since(entry.1))
            .as_secs();

        if entry.0 >= self.config.requests_per_window {
            return (false, 0, reset_secs);
        }

        entry.0 += 1;
        let remaining = self.config.requests_per_window - entry.0;
        (true, remaining, reset_secs)
    }

    /// Drop windows that ended long ago; returns how many were removed
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        let before = self.requests.len();
        self.requests.retain(|_, (_, started)| {
            now.duration_since(*started) < self.config.window_duration * 2
        });
        before.saturating_sub(self.requests.len())
    }

    pub fn tracked_clients(&self) -> usize {
        self.requests.len()
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn is_open_path(path: &str) -> bool {
    OPEN_PATHS.contains(&path)
}

/// Rate-limit bucket: API key, then proxy headers, then the socket peer
fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    header_str(headers, "x-api-key")
        .or_else(|| {
            header_str(headers, "x-forwarded-for")
                .and_then(|v| v.split(',').next())
                .map(str::trim)
        })
        .or_else(|| header_str(headers, "x-real-ip"))
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// API key authentication middleware (active only when a key is configured)
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, TableFailure> {
    let Some(expected) = state.api_key.as_deref() else {
        return Ok(next.run(request).await);
    };
    if is_open_path(request.uri().path()) {
        return Ok(next.run(request).await);
    }

    match header_str(&headers, "x-api-key") {
        Some(key) if key == expected => Ok(next.run(request).await),
        Some(_) => {
            warn!(path = %request.uri().path(), "Invalid API key attempted");
            Err(AppError::new(ErrorCode::ApiUnauthorized, "API key tidak valid").into())
        }
        None => Err(AppError::new(ErrorCode::ApiUnauthorized, "API key wajib disertakan").into()),
    }
}

/// Rate limiting middleware
pub async fn rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Result<Response, TableFailure> {
    if is_open_path(request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let rate_key = client_key(&headers, connect_info.map(|ConnectInfo(addr)| addr));

    let (allowed, remaining, reset) = state.rate_limiter.check(&rate_key);

    if !allowed {
        warn!(key = %rate_key, "Rate limit exceeded");
        return Err(AppError::new(
            ErrorCode::ApiRateLimited,
            format!("Terlalu banyak permintaan. Coba lagi dalam {} detik", reset),
        )
        .into());
    }

    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    headers.insert("x-ratelimit-remaining", remaining.into());
    headers.insert("x-ratelimit-reset", reset.into());

    Ok(response)
}

/// Request logging middleware
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    info!(
        method = %method,
        uri = %uri,
        status = %status.as_u16(),
        latency_ms = %latency.as_millis(),
        "Request completed"
    );

    response
}

/// Evict expired nutrition cache entries and stale rate-limit windows every minute
pub fn start_cleanup_task(state: Arc<AppState>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            let cache_removed = state.nutrition_cache.cleanup_expired();
            let windows_removed = state.rate_limiter.cleanup();
            if cache_removed > 0 || windows_removed > 0 {
                info!(cache_removed, windows_removed, "🧹 Cleanup finished");
            } else {
                debug!(clients = state.rate_limiter.tracked_clients(), "🧹 Nothing to clean");
            }
        }
    })
}
