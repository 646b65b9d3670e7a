//! The auth-specific error taxonomy. Kept separate from `CoreError` because
//! the failure modes here (bad credentials, token reuse) don't map cleanly
//! onto the bidding domain's vocabulary; `auction-api` flattens both into
//! one `ApiError` at the HTTP boundary.

use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("an account with this email already exists")]
    EmailTaken,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("refresh token is invalid or expired")]
    InvalidRefreshToken,

    /// A revoked refresh token was presented again: every outstanding
    /// token in its rotation family has now been revoked.
    #[error("refresh token reuse detected; all sessions for this account were revoked")]
    ReuseDetected,

    #[error("token error: {0}")]
    Token(String),

    #[error("auth repository error: {0}")]
    Repository(String),
}
