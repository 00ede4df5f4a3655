use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use lobby_api::config::Config;
use lobby_api::lobby::{LobbyManager, TokioScheduler};
use lobby_api::narration::{FallbackNarrator, HttpNarrator, NarrationProvider};
use lobby_api::routes::{cors_layer, ApiDoc};
use lobby_api::throttle::RateLimiter;
use lobby_api::AppState;

#[tokio::main]
async fn main() {
    // Load .env file (silently skip if missing; env vars may be set externally)
    if dotenvy::dotenv().is_err() {
        let env_path = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(env_path);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let port = config.port;

    let lobby = LobbyManager::new(config.lobby.clone(), Arc::new(TokioScheduler::new()));

    let narrator: Arc<dyn NarrationProvider> = match HttpNarrator::from_config(&config.narration)
        .expect("failed to build narration HTTP client")
    {
        Some(http) => {
            tracing::info!(model = %config.narration.model, base_url = %config.narration.base_url, "narration enabled");
            Arc::new(http)
        }
        None => {
            tracing::warn!("NARRATION_API_KEY not set; narration will use fallback lines");
            Arc::new(FallbackNarrator)
        }
    };

    tracing::info!(
        selection_window_ms = config.lobby.selection_window.as_millis() as u64,
        default_seats = config.lobby.default_seats,
        rate_limit = config.rate_limit.max_requests,
        cors_origins = ?config.cors_origins,
        "lobby-api configured"
    );

    let state = AppState {
        lobby: lobby.clone(),
        narrator,
        limiter: Arc::new(RateLimiter::new(
            config.rate_limit.max_requests,
            config.rate_limit.window,
        )),
    };

    let cors = cors_layer(&config.cors_origins);

    let app = Router::new()
        .merge(lobby_api::routes::router())
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "lobby-api listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("server error");

    lobby.shutdown();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(?e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
