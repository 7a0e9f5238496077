use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use uuid::Uuid;

use crate::auth::{resolve_session, CurrentUser};
use crate::error::AppError;
use crate::state::AppState;

/// Parses `Authorization: Bearer <uuid>`.
///
/// `Ok(None)` if the header is absent, `Err` if it is present but malformed.
pub fn bearer_token(parts: &Parts) -> Result<Option<Uuid>, AppError> {
    let Some(value) = parts.headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let malformed = || AppError::Unauthorized("Malformed Authorization header".to_string());
    let value = value.to_str().map_err(|_| malformed())?;
    let mut it = value.split_whitespace();
    let scheme = it.next().ok_or_else(malformed)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(malformed());
    }
    let token = it.next().ok_or_else(malformed)?;
    if it.next().is_some() {
        return Err(malformed());
    }
    Uuid::parse_str(token).map(Some).map_err(|_| malformed())
}

/// Extractor for endpoints that require a logged-in user.
#[derive(Debug, Clone)]
pub struct AuthUser(pub CurrentUser);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?
            .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?;
        Ok(AuthUser(resolve_session(&state.db, token).await?))
    }
}

/// Extractor for endpoints that personalise their response when a user is
/// logged in. Missing, malformed or expired tokens all mean "anonymous".
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<CurrentUser>);

impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = match bearer_token(parts) {
            Ok(Some(token)) => token,
            _ => return Ok(MaybeAuthUser(None)),
        };
        match resolve_session(&state.db, token).await {
            Ok(user) => Ok(MaybeAuthUser(Some(user))),
            Err(AppError::Unauthorized(_)) => Ok(MaybeAuthUser(None)),
            Err(e) => Err(e),
        }
    }
}
