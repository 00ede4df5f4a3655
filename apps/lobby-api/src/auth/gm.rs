//! GM bearer-token extraction.
//!
//! The token handed out at session creation must accompany every GM-only
//! request as `Authorization: Bearer <token>`. This extractor only checks the
//! header shape; the lobby verifies the token against the session.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::error::ApiError;

/// Raw GM token taken from the `Authorization` header.
#[derive(Debug, Clone)]
pub struct GmToken(pub String);

impl<S> FromRequestParts<S> for GmToken
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::unauthorized("Invalid Authorization header format"))?;

        Ok(GmToken(token.to_string()))
    }
}
