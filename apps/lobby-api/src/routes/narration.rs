//! Narrator flavor text. Never fails because of the upstream: provider errors
//! come back as a fallback line with `fallback: true`.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};

use crate::error::{ApiError, ApiErrorBody, FieldError};
use crate::narration::{narrate_or_fallback, Narration, NarrationRequest, MODEL_ALLOWLIST};
use crate::routes::ApiJson;
use crate::throttle::Throttled;
use crate::AppState;

/// Longest prompt accepted, in characters.
const MAX_PROMPT_CHARS: usize = 4_000;

pub fn router() -> Router<AppState> {
    Router::new().route("/narration", post(narrate))
}

fn validate(request: &NarrationRequest) -> Result<(), ApiError> {
    let mut errors = Vec::new();
    let prompt = request.prompt.trim();
    if prompt.is_empty() {
        errors.push(FieldError {
            field: "prompt".to_string(),
            message: "must not be empty".to_string(),
        });
    } else if prompt.chars().count() > MAX_PROMPT_CHARS {
        errors.push(FieldError {
            field: "prompt".to_string(),
            message: format!("must be at most {MAX_PROMPT_CHARS} characters"),
        });
    }
    if let Some(model) = request.model.as_deref() {
        if !MODEL_ALLOWLIST.contains(&model) {
            errors.push(FieldError {
                field: "model".to_string(),
                message: format!("model '{model}' is not allowed"),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::validation(errors))
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/narration",
    tag = "Narration",
    request_body = NarrationRequest,
    responses(
        (status = 200, description = "Narration or marked fallback", body = Narration),
        (status = 400, description = "Validation failed", body = ApiErrorBody),
        (status = 413, description = "Body too large", body = ApiErrorBody),
        (status = 429, description = "Too many requests from this client", body = ApiErrorBody),
    ),
)]
pub async fn narrate(
    _throttle: Throttled,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NarrationRequest>,
) -> Result<Json<Narration>, ApiError> {
    validate(&body)?;
    let narration = narrate_or_fallback(state.narrator.as_ref(), &body).await;
    Ok(Json(narration))
}
