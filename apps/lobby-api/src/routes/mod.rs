pub mod gm;
pub mod health;
pub mod narration;
pub mod sessions;

use axum::extract::{DefaultBodyLimit, FromRequest};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error::ApiError;
use crate::AppState;

/// Largest request body accepted on any route.
pub const MAX_BODY_BYTES: usize = 256 * 1024;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest(
            "/api/v1",
            sessions::router()
                .merge(gm::router())
                .merge(narration::router()),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}

/// CORS restricted to `origins`; a `*` entry allows any origin.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        let list: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(%origin, "ignoring unparsable CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(list)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
}

/// JSON body extractor whose rejections use the API error envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "gm_token",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health::health,
        // Sessions
        sessions::create_session,
        sessions::get_session,
        sessions::join_seat,
        sessions::set_ready,
        sessions::begin_selection,
        sessions::select_character,
        sessions::disconnect,
        // GM
        gm::force_start,
        gm::boot_inactive,
        gm::reset_session,
        gm::finish_session,
        gm::reopen_session,
        gm::close_session,
        // Narration
        narration::narrate,
    ),
    components(
        schemas(
            // Error types
            crate::error::ApiErrorBody,
            crate::error::ApiErrorDetail,
            crate::error::FieldError,
            // Lobby models
            crate::lobby::SessionView,
            crate::lobby::Player,
            crate::lobby::SessionStatus,
            crate::lobby::PlayerType,
            crate::lobby::Role,
            crate::lobby::CreateSession,
            crate::lobby::GmInfo,
            // Route request/response types
            health::HealthResponse,
            sessions::CreateSessionResponse,
            sessions::JoinRequest,
            sessions::ReadyRequest,
            sessions::SelectRequest,
            sessions::SeatRequest,
            crate::narration::NarrationRequest,
            crate::narration::Narration,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check"),
        (name = "Sessions", description = "Lobby seats and character selection"),
        (name = "GM", description = "Game Master controls"),
        (name = "Narration", description = "Narrator flavor text"),
    )
)]
pub struct ApiDoc;
