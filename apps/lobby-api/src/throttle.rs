//! Per-client request throttling for the unauthenticated routes that cost
//! something: session creation and narration.
//!
//! Each client gets a fixed window of `max_requests` calls. Clients are keyed
//! by peer IP when the server runs with connect info, otherwise they share one
//! bucket.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use dashmap::DashMap;

use crate::error::ApiError;
use crate::AppState;

/// Once this many clients are tracked, expired windows are dropped.
const PRUNE_AT: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window request counter keyed by client.
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    clients: DashMap<String, Window>,
}

impl RateLimiter {
    /// `max_requests == 0` disables throttling.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            clients: DashMap::new(),
        }
    }

    /// Count one request from `client`; `false` once its window is spent.
    pub fn check(&self, client: &str) -> bool {
        self.check_at(client, Instant::now())
    }

    fn check_at(&self, client: &str, now: Instant) -> bool {
        if self.max_requests == 0 {
            return true;
        }
        if self.clients.len() >= PRUNE_AT {
            self.clients
                .retain(|_, w| now.duration_since(w.started) < self.window);
        }

        let mut entry = self.clients.entry(client.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(entry.started) >= self.window {
            *entry = Window {
                started: now,
                count: 0,
            };
        }
        if entry.count >= self.max_requests {
            return false;
        }
        entry.count += 1;
        true
    }
}

/// Extractor that spends one request from the caller's window, rejecting with
/// 429 when it is empty.
#[derive(Debug, Clone, Copy)]
pub struct Throttled;

impl FromRequestParts<AppState> for Throttled {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let client = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        if state.limiter.check(&client) {
            Ok(Throttled)
        } else {
            tracing::warn!(%client, path = %parts.uri.path(), "request throttled");
            Err(ApiError::too_many_requests(
                "Too many requests, try again later",
            ))
        }
    }
}
