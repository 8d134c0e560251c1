use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use tokio::task::JoinHandle;

use super::handlers::AppState;
use crate::error::AppError;

static RATE_LIMIT: HeaderName = HeaderName::from_static("ratelimit");
static RATE_LIMIT_POLICY: HeaderName = HeaderName::from_static("ratelimit-policy");

/// Outcome of counting one request against a client's window
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitStatus {
    pub allowed: bool,
    pub limit: usize,
    pub remaining: usize,
    pub window: Duration,
    /// Until the oldest counted request leaves the window
    pub reset: Duration,
}

impl RateLimitStatus {
    /// Write `RateLimit-Policy` and `RateLimit` (IETF draft 8) headers
    pub fn write_headers(&self, headers: &mut HeaderMap) {
        let window = self.window.as_secs();
        let policy = format!("\"{}-in-{}s\"", self.limit, window);

        let values = [
            (
                &RATE_LIMIT_POLICY,
                format!("{};q={};w={}", policy, self.limit, window),
            ),
            (
                &RATE_LIMIT,
                format!("{};r={};t={}", policy, self.remaining, self.reset_secs()),
            ),
        ];
        for (name, value) in values {
            if let Ok(value) = HeaderValue::from_str(&value) {
                headers.insert(name.clone(), value);
            }
        }

        if !self.allowed {
            headers.insert(header::RETRY_AFTER, HeaderValue::from(self.reset_secs()));
        }
    }

    /// Reset rounded up to whole seconds
    pub fn reset_secs(&self) -> u64 {
        self.reset.as_secs() + u64::from(self.reset.subsec_nanos() > 0)
    }
}

/// Sliding-window request limiter keyed by client address
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    hits: DashMap<String, Vec<Instant>>,
}

impl RateLimiter {
    /// `max_requests == 0` disables limiting
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            hits: DashMap::new(),
        }
    }

    pub fn disabled() -> Self {
        Self::new(0, Duration::ZERO)
    }

    pub fn is_enabled(&self) -> bool {
        self.max_requests > 0
    }

    /// Count a request from `client`. `None` when limiting is disabled.
    pub fn check(&self, client: &str) -> Option<RateLimitStatus> {
        if !self.is_enabled() {
            return None;
        }

        let now = Instant::now();
        let mut attempts = self.hits.entry(client.to_string()).or_default();
        attempts.retain(|t| now.duration_since(*t) < self.window);

        let allowed = attempts.len() < self.max_requests;
        if allowed {
            attempts.push(now);
        } else {
            tracing::debug!(client, "Rate limit exceeded");
        }

        let reset = attempts
            .first()
            .map(|oldest| self.window.saturating_sub(now.duration_since(*oldest)))
            .unwrap_or(self.window);

        Some(RateLimitStatus {
            allowed,
            limit: self.max_requests,
            remaining: self.max_requests.saturating_sub(attempts.len()),
            window: self.window,
            reset,
        })
    }

    /// Forget clients with no request inside the window
    pub fn purge_idle(&self) -> usize {
        let now = Instant::now();
        let before = self.hits.len();
        self.hits
            .retain(|_, attempts| attempts.iter().any(|t| now.duration_since(*t) < self.window));
        before.saturating_sub(self.hits.len())
    }

    /// Run `purge_idle` every `period` on the tokio runtime
    pub fn spawn_sweeper(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let purged = self.purge_idle();
                if purged > 0 {
                    tracing::debug!("Forgot {} idle rate limit clients", purged);
                }
            }
        })
    }

    pub fn tracked_clients(&self) -> usize {
        self.hits.len()
    }
}

/// Client address. `X-Forwarded-For` is only honoured behind a trusted proxy.
fn client_key(req: &Request, trust_proxy: bool) -> String {
    if trust_proxy {
        if let Some(forwarded) = req
            .headers()
            .get("X-Forwarded-For")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.split(',').next())
            .map(str::trim)
            .filter(|h| !h.is_empty())
        {
            return forwarded.to_string();
        }
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let client = client_key(&req, state.config.trust_proxy);
    let Some(status) = state.rate_limiter.check(&client) else {
        return next.run(req).await;
    };

    let mut response = if status.allowed {
        next.run(req).await
    } else {
        AppError::TooManyRequests.into_response()
    };
    status.write_headers(response.headers_mut());
    response
}
