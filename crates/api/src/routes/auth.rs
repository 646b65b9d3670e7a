//! `/api/auth/*` — registration, login, refresh, logout.

use crate::auth_extractor::AuthUser;
use crate::dto::{LoginRequest, RefreshTokenRequest, RegisterRequest, TokenPairResponse, UserResponse};
use crate::envelope::Envelope;
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use validator::Validate;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh-token", post(refresh_token))
        .route("/logout", post(logout))
}

async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Envelope<UserResponse>>), ApiError> {
    body.validate()?;
    let user = state.auth.register(&body.email, &body.password, &body.display_name).await?;
    let response = UserResponse {
        id: user.id,
        email: user.email,
        display_name: user.display_name,
    };
    Ok((StatusCode::CREATED, Json(Envelope::ok("account created", response))))
}

async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<Envelope<TokenPairResponse>>, ApiError> {
    body.validate()?;
    let pair = state.auth.login(&body.email, &body.password).await?;
    let response = TokenPairResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
    };
    Ok(Json(Envelope::ok("logged in", response)))
}

async fn refresh_token(
    State(state): State<AppState>,
    Json(body): Json<RefreshTokenRequest>,
) -> Result<Json<Envelope<TokenPairResponse>>, ApiError> {
    body.validate()?;
    let pair = state.auth.refresh(&body.refresh_token).await?;
    let response = TokenPairResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
    };
    Ok(Json(Envelope::ok("token refreshed", response)))
}

async fn logout(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(body): Json<RefreshTokenRequest>,
) -> Result<Json<Envelope<()>>, ApiError> {
    body.validate()?;
    state.auth.logout(&body.refresh_token).await?;
    Ok(Json(Envelope::ok("logged out", ())))
}
