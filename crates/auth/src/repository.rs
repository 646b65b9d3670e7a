//! The repository contract `AuthService` depends on. `auction-auth` owns
//! its own persistence abstraction rather than reaching into
//! `auction-store`'s internals, even though [`PgAuthRepository`] shares the
//! same `users`/`refresh_tokens` tables and the same connection pool.

use crate::error::AuthResult;
use async_trait::async_trait;
use auction_domain::UserId;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub display_name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A single link in a refresh-token rotation chain. `token` is the opaque
/// 256-bit secret the client presents; `family_id` groups every token ever
/// issued from one login, so that redeeming a revoked token can revoke the
/// whole chain.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshToken {
    pub token: String,
    pub user_id: UserId,
    pub family_id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub replaced_by: Option<String>,
}

impl RefreshToken {
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && self.expires_at > now
    }
}

#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn create_user(&self, user: User) -> AuthResult<User>;
    async fn find_user_by_email(&self, email: &str) -> AuthResult<Option<User>>;
    async fn find_user_by_id(&self, id: UserId) -> AuthResult<Option<User>>;

    async fn insert_refresh_token(&self, token: RefreshToken) -> AuthResult<()>;
    async fn find_refresh_token(&self, token: &str) -> AuthResult<Option<RefreshToken>>;

    /// Atomically mark `old_token` revoked (`replaced_by = new.token`) and
    /// insert `new`. Both rows share `family_id`.
    async fn rotate_refresh_token(&self, old_token: &str, new: RefreshToken) -> AuthResult<()>;

    async fn revoke_refresh_token(&self, token: &str, at: DateTime<Utc>) -> AuthResult<()>;

    /// Revoke every unrevoked token sharing `family_id` — the reuse-defense
    /// response to a replayed, already-revoked refresh token.
    async fn revoke_family(&self, family_id: Uuid, at: DateTime<Utc>) -> AuthResult<()>;
}
