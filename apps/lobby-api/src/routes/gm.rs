//! GM-only session controls. Every handler requires the session's GM token
//! as a bearer credential.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, post};
use axum::{Json, Router};

use crate::auth::gm::GmToken;
use crate::error::{ApiError, ApiErrorBody};
use crate::lobby::SessionView;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sessions/{code}/force-start", post(force_start))
        .route("/sessions/{code}/boot-inactive", post(boot_inactive))
        .route("/sessions/{code}/reset", post(reset_session))
        .route("/sessions/{code}/finish", post(finish_session))
        .route("/sessions/{code}/reopen", post(reopen_session))
        .route("/sessions/{code}", delete(close_session))
}

#[utoipa::path(
    post,
    path = "/api/v1/sessions/{code}/force-start",
    tag = "GM",
    security(("gm_token" = [])),
    params(("code" = String, Path, description = "Session code")),
    responses(
        (status = 200, description = "Empty claims filled; session starting", body = SessionView),
        (status = 401, description = "Missing GM token", body = ApiErrorBody),
        (status = 403, description = "Wrong GM token", body = ApiErrorBody),
        (status = 404, description = "Not found", body = ApiErrorBody),
        (status = 409, description = "Selection already over", body = ApiErrorBody),
    ),
)]
pub async fn force_start(
    GmToken(token): GmToken,
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    Ok(Json(state.lobby.force_start(&code, &token)?))
}

#[utoipa::path(
    post,
    path = "/api/v1/sessions/{code}/boot-inactive",
    tag = "GM",
    security(("gm_token" = [])),
    params(("code" = String, Path, description = "Session code")),
    responses(
        (status = 200, description = "Unclaimed human seats handed to AI", body = SessionView),
        (status = 401, description = "Missing GM token", body = ApiErrorBody),
        (status = 403, description = "Wrong GM token", body = ApiErrorBody),
        (status = 404, description = "Not found", body = ApiErrorBody),
        (status = 409, description = "Selection already over", body = ApiErrorBody),
    ),
)]
pub async fn boot_inactive(
    GmToken(token): GmToken,
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    Ok(Json(state.lobby.boot_inactive_humans(&code, &token)?))
}

#[utoipa::path(
    post,
    path = "/api/v1/sessions/{code}/reset",
    tag = "GM",
    security(("gm_token" = [])),
    params(("code" = String, Path, description = "Session code")),
    responses(
        (status = 200, description = "Back in the lobby with claims cleared", body = SessionView),
        (status = 401, description = "Missing GM token", body = ApiErrorBody),
        (status = 403, description = "Wrong GM token", body = ApiErrorBody),
        (status = 404, description = "Not found", body = ApiErrorBody),
        (status = 409, description = "Session is closed", body = ApiErrorBody),
    ),
)]
pub async fn reset_session(
    GmToken(token): GmToken,
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    Ok(Json(state.lobby.reset_session(&code, &token)?))
}

#[utoipa::path(
    post,
    path = "/api/v1/sessions/{code}/finish",
    tag = "GM",
    security(("gm_token" = [])),
    params(("code" = String, Path, description = "Session code")),
    responses(
        (status = 200, description = "Game ended; session closed", body = SessionView),
        (status = 401, description = "Missing GM token", body = ApiErrorBody),
        (status = 403, description = "Wrong GM token", body = ApiErrorBody),
        (status = 404, description = "Not found", body = ApiErrorBody),
        (status = 409, description = "No game running", body = ApiErrorBody),
    ),
)]
pub async fn finish_session(
    GmToken(token): GmToken,
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    Ok(Json(state.lobby.finish_session(&code, &token)?))
}

#[utoipa::path(
    post,
    path = "/api/v1/sessions/{code}/reopen",
    tag = "GM",
    security(("gm_token" = [])),
    params(("code" = String, Path, description = "Session code")),
    responses(
        (status = 200, description = "Closed session back in the lobby", body = SessionView),
        (status = 401, description = "Missing GM token", body = ApiErrorBody),
        (status = 403, description = "Wrong GM token", body = ApiErrorBody),
        (status = 404, description = "Not found", body = ApiErrorBody),
        (status = 409, description = "Session is not closed", body = ApiErrorBody),
    ),
)]
pub async fn reopen_session(
    GmToken(token): GmToken,
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    Ok(Json(state.lobby.reopen_session(&code, &token)?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/sessions/{code}",
    tag = "GM",
    security(("gm_token" = [])),
    params(("code" = String, Path, description = "Session code")),
    responses(
        (status = 204, description = "Session removed"),
        (status = 401, description = "Missing GM token", body = ApiErrorBody),
        (status = 403, description = "Wrong GM token", body = ApiErrorBody),
        (status = 404, description = "Not found", body = ApiErrorBody),
    ),
)]
pub async fn close_session(
    GmToken(token): GmToken,
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.lobby.close_session(&code, &token)?;
    Ok(StatusCode::NO_CONTENT)
}
