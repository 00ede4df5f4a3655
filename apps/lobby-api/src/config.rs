use std::time::Duration;

use crate::lobby::characters::default_pool;
use crate::lobby::delay::TriangularDelay;
use crate::lobby::manager::LobbyConfig;

/// Lobby API configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port the HTTP server binds to.
    pub port: u16,
    /// Countdown, delays and default seating for new sessions.
    pub lobby: LobbyConfig,
    pub narration: NarrationConfig,
    /// Throttle on session creation and narration, per client.
    pub rate_limit: RateLimitConfig,
    /// Browser origins allowed by CORS. `*` allows any.
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Requests allowed per window; 0 disables throttling.
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 60,
            window: Duration::from_secs(60),
        }
    }
}

/// Local Expo/web dev servers.
pub const DEFAULT_CORS_ORIGINS: [&str; 4] = [
    "http://localhost:8081",
    "http://localhost:8082",
    "http://127.0.0.1:8081",
    "http://127.0.0.1:8082",
];

/// Settings for the upstream text-generation service.
#[derive(Debug, Clone)]
pub struct NarrationConfig {
    /// API key; narration falls back to canned lines when unset.
    pub api_key: Option<String>,
    /// Origin of an OpenAI-compatible API (e.g. `https://api.openai.com`).
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-4.1-mini".to_string(),
            timeout: Duration::from_millis(8_000),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Every variable is optional. Panics with a descriptive message if the
    /// lobby settings fail [`LobbyConfig::validate`].
    pub fn from_env() -> Self {
        let defaults = LobbyConfig::default();
        let ai_delay = TriangularDelay::from_millis(
            millis_var("AI_DELAY_MIN_MS", 3_000),
            millis_var("AI_DELAY_MODE_MS", 6_500),
            millis_var("AI_DELAY_MAX_MS", 15_000),
        )
        .unwrap_or_else(|e| panic!("invalid AI delay settings: {e}"));

        let characters = std::env::var("CHARACTER_POOL")
            .ok()
            .map(|v| parse_list(&v))
            .filter(|pool| !pool.is_empty())
            .unwrap_or_else(default_pool);

        let lobby = LobbyConfig {
            selection_window: Duration::from_millis(millis_var("SELECTION_WINDOW_MS", 20_000)),
            start_delay: Duration::from_millis(millis_var("START_DELAY_MS", 2_000)),
            ai_delay,
            default_seats: parsed_var("DEFAULT_SEATS").unwrap_or(defaults.default_seats),
            characters,
            idle_ttl: match parsed_var::<u64>("SESSION_IDLE_TTL_MS") {
                Some(0) => None,
                Some(ms) => Some(Duration::from_millis(ms)),
                None => defaults.idle_ttl,
            },
        };
        if let Err(e) = lobby.validate() {
            panic!("invalid lobby settings: {e}");
        }

        let narration_defaults = NarrationConfig::default();
        let rate_defaults = RateLimitConfig::default();

        Self {
            port: parsed_var("PORT").unwrap_or(4100),
            lobby,
            narration: NarrationConfig {
                api_key: std::env::var("NARRATION_API_KEY").ok().filter(|s| !s.is_empty()),
                base_url: std::env::var("NARRATION_BASE_URL")
                    .ok()
                    .filter(|s| !s.is_empty())
                    .unwrap_or(narration_defaults.base_url),
                model: std::env::var("NARRATION_MODEL")
                    .ok()
                    .filter(|s| !s.is_empty())
                    .unwrap_or(narration_defaults.model),
                timeout: Duration::from_millis(millis_var(
                    "NARRATION_TIMEOUT_MS",
                    narration_defaults.timeout.as_millis() as u64,
                )),
            },
            rate_limit: RateLimitConfig {
                max_requests: parsed_var("RATE_LIMIT_MAX").unwrap_or(rate_defaults.max_requests),
                window: Duration::from_millis(millis_var(
                    "RATE_LIMIT_WINDOW_MS",
                    rate_defaults.window.as_millis() as u64,
                )),
            },
            cors_origins: std::env::var("CORS_ORIGINS")
                .ok()
                .map(|v| parse_list(&v))
                .filter(|list| !list.is_empty())
                .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect()),
        }
    }
}

fn parsed_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

fn millis_var(name: &str, default: u64) -> u64 {
    parsed_var(name).unwrap_or(default)
}

/// Split a comma-separated list, dropping blanks.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
