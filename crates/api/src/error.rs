//! `ApiError` flattens `CoreError`, `StoreError`, and `AuthError` onto the
//! §7 taxonomy, grounded in the teacher's `PodAIError` constructor-method
//! style but implementing `IntoResponse` instead of wrapping `Client`/`rpc`
//! failures.

use crate::envelope::Envelope;
use auction_auth::AuthError;
use auction_domain::CoreError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("{0}")]
    BusinessRule(String),

    #[error("authentication error: {0}")]
    Auth(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("rate limited")]
    RateLimited,

    #[error("server busy: {0}")]
    Transient(String),

    #[error("internal error")]
    Internal,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::BusinessRule(_) => StatusCode::BAD_REQUEST,
            Self::Auth(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Transient(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Envelope::<()>::err(self.to_string(), Vec::new());
        (status, Json(body)).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(m) => Self::Validation(m),
            CoreError::BusinessRule(m) => Self::BusinessRule(m),
            CoreError::NotActive => Self::BusinessRule(err.to_string()),
            CoreError::Ended => Self::BusinessRule(err.to_string()),
            CoreError::SelfBid => Self::BusinessRule(err.to_string()),
            CoreError::Insufficient { .. } => Self::BusinessRule(err.to_string()),
            CoreError::Auth(m) => Self::Auth(m),
            CoreError::NotFound(m) => Self::NotFound(m),
            CoreError::Conflict => Self::Conflict("the auction changed while processing this request, please retry".to_string()),
            CoreError::RateLimited => Self::RateLimited,
            CoreError::Transient(m) => Self::Transient(m),
            CoreError::Internal => Self::Internal,
        }
    }
}

impl From<auction_store::StoreError> for ApiError {
    fn from(err: auction_store::StoreError) -> Self {
        match err {
            auction_store::StoreError::Duplicate(field) => Self::Validation(format!("duplicate value for {field}")),
            auction_store::StoreError::Conflict => Self::Conflict(err.to_string()),
            auction_store::StoreError::Backend(_) => {
                tracing::warn!("store backend error: {err}");
                Self::Internal
            }
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::EmailTaken => Self::Validation(err.to_string()),
            AuthError::InvalidCredentials => Self::Auth(err.to_string()),
            AuthError::InvalidRefreshToken => Self::Auth(err.to_string()),
            AuthError::ReuseDetected => Self::Auth(err.to_string()),
            AuthError::Token(_) => Self::Auth(err.to_string()),
            AuthError::Repository(m) => Self::Validation(m),
        }
    }
}
