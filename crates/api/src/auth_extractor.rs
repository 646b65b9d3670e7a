//! `AuthUser` — an axum extractor that validates the `Authorization:
//! Bearer <token>` header against `AuthService` and yields the caller's
//! `UserId`, so handlers that require auth just take it as a parameter.

use crate::error::ApiError;
use crate::state::AppState;
use auction_domain::UserId;
use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

pub struct AuthUser(pub UserId);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Auth("missing authorization header".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Auth("expected a bearer token".to_string()))?;

        let claims = state.auth.validate_access_token(token)?;
        let user_id = claims.user_id()?;
        Ok(AuthUser(user_id))
    }
}
