//! Player-facing session endpoints. Clients poll `GET /sessions/{code}`;
//! every mutation answers with the fresh snapshot.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{ApiError, ApiErrorBody};
use crate::lobby::{CreateSession, SessionView};
use crate::routes::ApiJson;
use crate::throttle::Throttled;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/{code}", get(get_session))
        .route("/sessions/{code}/join", post(join_seat))
        .route("/sessions/{code}/ready", post(set_ready))
        .route("/sessions/{code}/selection", post(begin_selection))
        .route("/sessions/{code}/select", post(select_character))
        .route("/sessions/{code}/disconnect", post(disconnect))
}

// ---------------------------------------------------------------------------
// POST /api/v1/sessions
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateSessionResponse {
    pub session: SessionView,
    /// Bearer token for GM-only endpoints. Only returned here.
    pub gm_token: String,
}

#[utoipa::path(
    post,
    path = "/api/v1/sessions",
    tag = "Sessions",
    request_body = CreateSession,
    responses(
        (status = 201, description = "Session created", body = CreateSessionResponse),
        (status = 400, description = "Bad request", body = ApiErrorBody),
        (status = 413, description = "Body too large", body = ApiErrorBody),
        (status = 429, description = "Too many requests from this client", body = ApiErrorBody),
        (status = 503, description = "No free session code", body = ApiErrorBody),
    ),
)]
pub async fn create_session(
    _throttle: Throttled,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateSession>,
) -> Result<(StatusCode, Json<CreateSessionResponse>), ApiError> {
    let created = state.lobby.create_session(body)?;
    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session: created.session,
            gm_token: created.gm_token,
        }),
    ))
}

// ---------------------------------------------------------------------------
// GET /api/v1/sessions/:code
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/sessions/{code}",
    tag = "Sessions",
    params(("code" = String, Path, description = "Session code")),
    responses(
        (status = 200, description = "Current session state", body = SessionView),
        (status = 404, description = "Not found", body = ApiErrorBody),
    ),
)]
pub async fn get_session(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    Ok(Json(state.lobby.get_state(&code)?))
}

// ---------------------------------------------------------------------------
// POST /api/v1/sessions/:code/join
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
pub struct JoinRequest {
    pub seat: usize,
    pub user_id: Option<String>,
    pub name: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/v1/sessions/{code}/join",
    tag = "Sessions",
    params(("code" = String, Path, description = "Session code")),
    request_body = JoinRequest,
    responses(
        (status = 200, description = "Seat joined", body = SessionView),
        (status = 400, description = "Bad request", body = ApiErrorBody),
        (status = 404, description = "Session or seat not found", body = ApiErrorBody),
        (status = 409, description = "Seat taken or reserved", body = ApiErrorBody),
    ),
)]
pub async fn join_seat(
    State(state): State<AppState>,
    Path(code): Path<String>,
    ApiJson(body): ApiJson<JoinRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let view = state
        .lobby
        .join_seat(&code, body.seat, body.user_id, body.name)?;
    Ok(Json(view))
}

// ---------------------------------------------------------------------------
// POST /api/v1/sessions/:code/ready
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReadyRequest {
    pub seat: usize,
    pub ready: bool,
}

#[utoipa::path(
    post,
    path = "/api/v1/sessions/{code}/ready",
    tag = "Sessions",
    params(("code" = String, Path, description = "Session code")),
    request_body = ReadyRequest,
    responses(
        (status = 200, description = "Ready state updated", body = SessionView),
        (status = 404, description = "Session or seat not found", body = ApiErrorBody),
        (status = 409, description = "Seat not joined or AI-controlled", body = ApiErrorBody),
    ),
)]
pub async fn set_ready(
    State(state): State<AppState>,
    Path(code): Path<String>,
    ApiJson(body): ApiJson<ReadyRequest>,
) -> Result<Json<SessionView>, ApiError> {
    Ok(Json(state.lobby.set_ready(&code, body.seat, body.ready)?))
}

// ---------------------------------------------------------------------------
// POST /api/v1/sessions/:code/selection
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/api/v1/sessions/{code}/selection",
    tag = "Sessions",
    params(("code" = String, Path, description = "Session code")),
    responses(
        (status = 200, description = "Countdown running; `selection_ends_at` is set", body = SessionView),
        (status = 404, description = "Not found", body = ApiErrorBody),
        (status = 409, description = "Selection already over", body = ApiErrorBody),
    ),
)]
pub async fn begin_selection(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    Ok(Json(state.lobby.begin_selection_countdown(&code)?))
}

// ---------------------------------------------------------------------------
// POST /api/v1/sessions/:code/select
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
pub struct SelectRequest {
    pub seat: usize,
    pub character: String,
}

#[utoipa::path(
    post,
    path = "/api/v1/sessions/{code}/select",
    tag = "Sessions",
    params(("code" = String, Path, description = "Session code")),
    request_body = SelectRequest,
    responses(
        (status = 200, description = "Character claimed", body = SessionView),
        (status = 400, description = "Bad request", body = ApiErrorBody),
        (status = 404, description = "Session, seat or character not found", body = ApiErrorBody),
        (status = 409, description = "Character taken or selection closed", body = ApiErrorBody),
    ),
)]
pub async fn select_character(
    State(state): State<AppState>,
    Path(code): Path<String>,
    ApiJson(body): ApiJson<SelectRequest>,
) -> Result<Json<SessionView>, ApiError> {
    if body.character.trim().is_empty() {
        return Err(ApiError::bad_request("character must not be empty"));
    }
    let view = state
        .lobby
        .select_character(&code, body.seat, &body.character)?;
    Ok(Json(view))
}

// ---------------------------------------------------------------------------
// POST /api/v1/sessions/:code/disconnect
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
pub struct SeatRequest {
    pub seat: usize,
}

#[utoipa::path(
    post,
    path = "/api/v1/sessions/{code}/disconnect",
    tag = "Sessions",
    params(("code" = String, Path, description = "Session code")),
    request_body = SeatRequest,
    responses(
        (status = 200, description = "Seat marked disconnected", body = SessionView),
        (status = 404, description = "Session or seat not found", body = ApiErrorBody),
    ),
)]
pub async fn disconnect(
    State(state): State<AppState>,
    Path(code): Path<String>,
    ApiJson(body): ApiJson<SeatRequest>,
) -> Result<Json<SessionView>, ApiError> {
    Ok(Json(state.lobby.mark_disconnected(&code, body.seat)?))
}
