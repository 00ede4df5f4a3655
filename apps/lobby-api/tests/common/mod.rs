#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use axum::Router;
use axum_test::TestServer;
use serde_json::Value;

use lobby_api::config::{Config, NarrationConfig, RateLimitConfig};
use lobby_api::lobby::delay::TriangularDelay;
use lobby_api::lobby::manager::LobbyConfig;
use lobby_api::lobby::{LobbyManager, ManualScheduler};
use lobby_api::narration::{FallbackNarrator, NarrationProvider};
use lobby_api::throttle::RateLimiter;
use lobby_api::AppState;

/// Countdown used by HTTP tests; the scheduler clock is advanced by hand.
pub const SELECTION_WINDOW_MS: u64 = 50;
pub const START_DELAY_MS: u64 = 2_000;
pub const AI_DELAY_MAX_MS: u64 = 300;
/// Throttled requests allowed per client per minute in HTTP tests.
pub const RATE_LIMIT_MAX: u32 = 30;
pub const ALLOWED_ORIGIN: &str = "http://localhost:8081";

pub fn test_config() -> Config {
    Config {
        port: 0,
        lobby: LobbyConfig {
            selection_window: Duration::from_millis(SELECTION_WINDOW_MS),
            start_delay: Duration::from_millis(START_DELAY_MS),
            ai_delay: TriangularDelay::from_millis(100, 150, AI_DELAY_MAX_MS).unwrap(),
            idle_ttl: None,
            ..LobbyConfig::default()
        },
        narration: NarrationConfig::default(),
        rate_limit: RateLimitConfig {
            max_requests: RATE_LIMIT_MAX,
            window: Duration::from_secs(60),
        },
        cors_origins: vec![ALLOWED_ORIGIN.to_string()],
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub clock: Arc<ManualScheduler>,
}

impl TestApp {
    pub fn advance_ms(&self, ms: u64) {
        self.clock.advance(Duration::from_millis(ms));
    }
}

/// Build the router over a manual clock and the given narrator.
pub fn test_app_with(narrator: Arc<dyn NarrationProvider>) -> TestApp {
    let config = test_config();
    let clock = Arc::new(ManualScheduler::new());
    let lobby = LobbyManager::new(config.lobby.clone(), clock.clone());
    let state = AppState {
        lobby,
        narrator,
        limiter: Arc::new(RateLimiter::new(
            config.rate_limit.max_requests,
            config.rate_limit.window,
        )),
    };
    let app: Router = lobby_api::routes::router()
        .layer(lobby_api::routes::cors_layer(&config.cors_origins))
        .with_state(state.clone());
    TestApp {
        server: TestServer::new(app).unwrap(),
        state,
        clock,
    }
}

pub fn test_app() -> TestApp {
    test_app_with(Arc::new(FallbackNarrator))
}

/// Create a session and return `(code, gm_token)`.
pub async fn create_session(server: &TestServer, body: Value) -> (String, String) {
    let resp = server.post("/api/v1/sessions").json(&body).await;
    resp.assert_status(StatusCode::CREATED);
    let body: Value = resp.json();
    (
        body["session"]["id"].as_str().unwrap().to_string(),
        body["gm_token"].as_str().unwrap().to_string(),
    )
}

pub async fn join(server: &TestServer, code: &str, seat: usize, user_id: &str) -> Value {
    let resp = server
        .post(&format!("/api/v1/sessions/{code}/join"))
        .json(&serde_json::json!({ "seat": seat, "user_id": user_id, "name": user_id }))
        .await;
    resp.assert_status_ok();
    resp.json()
}

pub async fn select(server: &TestServer, code: &str, seat: usize, character: &str) -> Value {
    let resp = server
        .post(&format!("/api/v1/sessions/{code}/select"))
        .json(&serde_json::json!({ "seat": seat, "character": character }))
        .await;
    resp.assert_status_ok();
    resp.json()
}

pub async fn state(server: &TestServer, code: &str) -> Value {
    let resp = server.get(&format!("/api/v1/sessions/{code}")).await;
    resp.assert_status_ok();
    resp.json()
}

/// POST a GM action with the bearer token.
pub async fn gm_post(server: &TestServer, code: &str, action: &str, token: &str) -> axum_test::TestResponse {
    server
        .post(&format!("/api/v1/sessions/{code}/{action}"))
        .add_header(AUTHORIZATION, format!("Bearer {token}"))
        .await
}
