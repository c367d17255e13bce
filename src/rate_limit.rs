//! Fixed-window request limiter keyed by client IP.

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::error::ApiError;

#[derive(Debug)]
struct Window {
    started: Instant,
    hits: u32,
}

#[derive(Debug, Clone)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    trust_proxy: bool,
    windows: Arc<Mutex<HashMap<String, Window>>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration, trust_proxy: bool) -> Self {
        Self {
            max_requests,
            window,
            trust_proxy,
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Counts a request against `key`; false once the window is full.
    pub async fn allow(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;

        // Evict expired windows so the map tracks active clients only.
        windows.retain(|_, w| now.duration_since(w.started) < self.window);

        let entry = windows.entry(key.to_string()).or_insert(Window {
            started: now,
            hits: 0,
        });
        if entry.hits >= self.max_requests {
            return false;
        }
        entry.hits += 1;
        true
    }
}

/// Client address. Behind a trusted proxy that is the hop the proxy
/// appended (the last `X-Forwarded-For` entry); earlier entries are written
/// by the client and never used. Otherwise the socket peer.
fn client_key(request: &Request, trust_proxy: bool) -> String {
    let forwarded = trust_proxy
        .then(|| request.headers().get("x-forwarded-for"))
        .flatten()
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.rsplit(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty());

    forwarded
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

/// Middleware: 429 once a client exceeds its budget for the window.
pub async fn limit_requests(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let key = client_key(&request, limiter.trust_proxy);
    if !limiter.allow(&key).await {
        tracing::warn!(client = %key, "rate limit exceeded");
        return ApiError::TooManyRequests.into_response();
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, middleware, routing::get, Router};
    use tower::ServiceExt;

    fn limited_app(limiter: RateLimiter) -> Router {
        Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(limiter, limit_requests))
    }

    #[tokio::test]
    async fn test_allows_up_to_budget_per_key() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60), false);
        assert!(limiter.allow("1.1.1.1").await);
        assert!(limiter.allow("1.1.1.1").await);
        assert!(!limiter.allow("1.1.1.1").await);
        assert!(limiter.allow("2.2.2.2").await);
    }

    #[tokio::test]
    async fn test_window_expiry_resets_budget() {
        let limiter = RateLimiter::new(1, Duration::from_millis(20), false);
        assert!(limiter.allow("ip").await);
        assert!(!limiter.allow("ip").await);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(limiter.allow("ip").await);
    }

    #[tokio::test]
    async fn test_middleware_returns_429_with_error_body() {
        let app = limited_app(RateLimiter::new(1, Duration::from_secs(60), true));

        let request = || {
            axum::http::Request::get("/")
                .header("x-forwarded-for", "9.9.9.9, 10.0.0.1")
                .body(Body::empty())
                .unwrap()
        };

        let res = app.clone().oneshot(request()).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let res = app.oneshot(request()).await.unwrap();
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["error"].as_str().unwrap().starts_with("Too many requests"));
    }

    #[tokio::test]
    async fn test_spoofed_leading_hops_share_the_proxy_hop_budget() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60), true);
        let app = limited_app(limiter.clone());

        for i in 0..10 {
            let request = axum::http::Request::get("/")
                .header("x-forwarded-for", format!("10.0.0.{i}, 203.0.113.7"))
                .body(Body::empty())
                .unwrap();
            let res = app.clone().oneshot(request).await.unwrap();
            let expected = if i == 0 {
                StatusCode::OK
            } else {
                StatusCode::TOO_MANY_REQUESTS
            };
            assert_eq!(res.status(), expected, "request {i}");
        }
        assert_eq!(limiter.windows.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_forwarded_header_ignored_without_trusted_proxy() {
        let app = limited_app(RateLimiter::new(1, Duration::from_secs(60), false));
        let peer: SocketAddr = "198.51.100.4:40000".parse().unwrap();

        for (i, expected) in [StatusCode::OK, StatusCode::TOO_MANY_REQUESTS]
            .into_iter()
            .enumerate()
        {
            let request = axum::http::Request::get("/")
                .header("x-forwarded-for", format!("10.0.0.{i}"))
                .extension(ConnectInfo(peer))
                .body(Body::empty())
                .unwrap();
            let res = app.clone().oneshot(request).await.unwrap();
            assert_eq!(res.status(), expected);
        }
    }
}
