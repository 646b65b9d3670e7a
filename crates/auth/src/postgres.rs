//! PostgreSQL-backed [`AuthRepository`], sharing the `users` and
//! `refresh_tokens` tables migrated by `auction-store`.

use crate::error::{AuthError, AuthResult};
use crate::repository::{AuthRepository, RefreshToken, User};
use async_trait::async_trait;
use auction_domain::UserId;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn user_from_row(row: &sqlx::postgres::PgRow) -> sqlx::Result<User> {
        Ok(User {
            id: UserId(row.try_get("id")?),
            email: row.try_get("email")?,
            display_name: row.try_get("display_name")?,
            password_hash: row.try_get("password_hash")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn refresh_token_from_row(row: &sqlx::postgres::PgRow) -> sqlx::Result<RefreshToken> {
        Ok(RefreshToken {
            token: row.try_get("id")?,
            user_id: UserId(row.try_get("user_id")?),
            family_id: row.try_get("family_id")?,
            issued_at: row.try_get("issued_at")?,
            expires_at: row.try_get("expires_at")?,
            revoked_at: row.try_get("revoked_at")?,
            replaced_by: row.try_get("replaced_by")?,
        })
    }

    fn to_sqlx_err(err: sqlx::Error) -> AuthError {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some("23505") {
                return AuthError::EmailTaken;
            }
        }
        AuthError::Repository(err.to_string())
    }
}

#[async_trait]
impl AuthRepository for PgAuthRepository {
    async fn create_user(&self, user: User) -> AuthResult<User> {
        sqlx::query(
            "INSERT INTO users (id, email, display_name, password_hash, created_at) VALUES ($1,$2,$3,$4,$5)",
        )
        .bind(user.id.0)
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(Self::to_sqlx_err)?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(Self::to_sqlx_err)?;
        row.as_ref()
            .map(Self::user_from_row)
            .transpose()
            .map_err(Self::to_sqlx_err)
    }

    async fn find_user_by_id(&self, id: UserId) -> AuthResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(Self::to_sqlx_err)?;
        row.as_ref()
            .map(Self::user_from_row)
            .transpose()
            .map_err(Self::to_sqlx_err)
    }

    async fn insert_refresh_token(&self, token: RefreshToken) -> AuthResult<()> {
        sqlx::query(
            "INSERT INTO refresh_tokens (id, user_id, family_id, issued_at, expires_at, revoked_at, replaced_by)
             VALUES ($1,$2,$3,$4,$5,$6,$7)",
        )
        .bind(&token.token)
        .bind(token.user_id.0)
        .bind(token.family_id)
        .bind(token.issued_at)
        .bind(token.expires_at)
        .bind(token.revoked_at)
        .bind(&token.replaced_by)
        .execute(&self.pool)
        .await
        .map_err(Self::to_sqlx_err)?;
        Ok(())
    }

    async fn find_refresh_token(&self, token: &str) -> AuthResult<Option<RefreshToken>> {
        let row = sqlx::query("SELECT * FROM refresh_tokens WHERE id = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(Self::to_sqlx_err)?;
        row.as_ref()
            .map(Self::refresh_token_from_row)
            .transpose()
            .map_err(Self::to_sqlx_err)
    }

    async fn rotate_refresh_token(&self, old_token: &str, new: RefreshToken) -> AuthResult<()> {
        let mut tx = self.pool.begin().await.map_err(Self::to_sqlx_err)?;

        sqlx::query("UPDATE refresh_tokens SET revoked_at = $1, replaced_by = $2 WHERE id = $3")
            .bind(new.issued_at)
            .bind(&new.token)
            .bind(old_token)
            .execute(&mut *tx)
            .await
            .map_err(Self::to_sqlx_err)?;

        sqlx::query(
            "INSERT INTO refresh_tokens (id, user_id, family_id, issued_at, expires_at, revoked_at, replaced_by)
             VALUES ($1,$2,$3,$4,$5,NULL,NULL)",
        )
        .bind(&new.token)
        .bind(new.user_id.0)
        .bind(new.family_id)
        .bind(new.issued_at)
        .bind(new.expires_at)
        .execute(&mut *tx)
        .await
        .map_err(Self::to_sqlx_err)?;

        tx.commit().await.map_err(Self::to_sqlx_err)?;
        Ok(())
    }

    async fn revoke_refresh_token(&self, token: &str, at: DateTime<Utc>) -> AuthResult<()> {
        sqlx::query("UPDATE refresh_tokens SET revoked_at = $1 WHERE id = $2 AND revoked_at IS NULL")
            .bind(at)
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(Self::to_sqlx_err)?;
        Ok(())
    }

    async fn revoke_family(&self, family_id: Uuid, at: DateTime<Utc>) -> AuthResult<()> {
        sqlx::query("UPDATE refresh_tokens SET revoked_at = $1 WHERE family_id = $2 AND revoked_at IS NULL")
            .bind(at)
            .bind(family_id)
            .execute(&self.pool)
            .await
            .map_err(Self::to_sqlx_err)?;
        Ok(())
    }
}
