pub mod auth;
pub mod config;
pub mod error;
pub mod lobby;
pub mod narration;
pub mod routes;
pub mod throttle;

use std::sync::Arc;

use lobby::LobbyManager;
use narration::NarrationProvider;
use throttle::RateLimiter;

/// Shared application state available to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub lobby: LobbyManager,
    pub narrator: Arc<dyn NarrationProvider>,
    pub limiter: Arc<RateLimiter>,
}
