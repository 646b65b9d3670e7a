//! Registration, login, and refresh-token rotation, wired against an
//! [`AuthRepository`] trait object so `auction-api`'s composition root can
//! swap the Postgres implementation for the in-memory one in tests.

use crate::error::{AuthError, AuthResult};
use crate::jwt::{self, Claims};
use crate::password;
use crate::repository::{AuthRepository, RefreshToken, User};
use auction_domain::{Clock, UserId};
use chrono::Duration;
use std::sync::Arc;
use uuid::Uuid;

/// Recommended refresh-token lifetime.
pub const REFRESH_TOKEN_TTL: Duration = Duration::days(7);

#[derive(Debug)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

pub struct AuthService {
    repo: Arc<dyn AuthRepository>,
    clock: Arc<dyn Clock>,
    signing_key: String,
    issuer: String,
    audience: String,
}

impl AuthService {
    pub fn new(
        repo: Arc<dyn AuthRepository>,
        clock: Arc<dyn Clock>,
        signing_key: String,
        issuer: String,
        audience: String,
    ) -> Self {
        Self {
            repo,
            clock,
            signing_key,
            issuer,
            audience,
        }
    }

    pub async fn register(&self, email: &str, password: &str, display_name: &str) -> AuthResult<User> {
        if password.len() < crate::password::MIN_PASSWORD_LEN {
            return Err(AuthError::Repository(format!(
                "password must be at least {} characters",
                crate::password::MIN_PASSWORD_LEN
            )));
        }
        if self.repo.find_user_by_email(email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }
        let user = User {
            id: UserId::new(),
            email: email.to_string(),
            display_name: display_name.to_string(),
            password_hash: password::hash_password(password)?,
            created_at: self.clock.now(),
        };
        self.repo.create_user(user).await
    }

    pub async fn login(&self, email: &str, password_attempt: &str) -> AuthResult<TokenPair> {
        let user = self
            .repo
            .find_user_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        if !password::verify_password(password_attempt, &user.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }
        self.issue_token_pair(&user, Uuid::new_v4()).await
    }

    /// Redeem `presented` for a fresh token pair. Presenting an
    /// already-revoked token revokes the entire rotation family and
    /// reports [`AuthError::ReuseDetected`].
    pub async fn refresh(&self, presented: &str) -> AuthResult<TokenPair> {
        let now = self.clock.now();
        let existing = self
            .repo
            .find_refresh_token(presented)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        if existing.revoked_at.is_some() {
            self.repo.revoke_family(existing.family_id, now).await?;
            tracing::warn!(user_id = %existing.user_id, family_id = %existing.family_id, "refresh token reuse detected");
            return Err(AuthError::ReuseDetected);
        }
        if existing.expires_at <= now {
            return Err(AuthError::InvalidRefreshToken);
        }

        let user = self
            .repo
            .find_user_by_id(existing.user_id)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        let new_token = RefreshToken {
            token: generate_opaque_token(),
            user_id: user.id,
            family_id: existing.family_id,
            issued_at: now,
            expires_at: now + REFRESH_TOKEN_TTL,
            revoked_at: None,
            replaced_by: None,
        };
        self.repo.rotate_refresh_token(presented, new_token.clone()).await?;

        let access_token = jwt::encode_access_token(
            user.id,
            &user.email,
            now,
            &self.signing_key,
            &self.issuer,
            &self.audience,
        )?;
        Ok(TokenPair {
            access_token,
            refresh_token: new_token.token,
        })
    }

    /// Revokes only the presented token; a clean logout is not a
    /// reuse-attack signal, so the rest of the family stays valid.
    pub async fn logout(&self, presented: &str) -> AuthResult<()> {
        self.repo.revoke_refresh_token(presented, self.clock.now()).await
    }

    pub fn validate_access_token(&self, token: &str) -> AuthResult<Claims> {
        jwt::decode_access_token(token, &self.signing_key, &self.issuer, &self.audience)
    }

    async fn issue_token_pair(&self, user: &User, family_id: Uuid) -> AuthResult<TokenPair> {
        let now = self.clock.now();
        let refresh_token = RefreshToken {
            token: generate_opaque_token(),
            user_id: user.id,
            family_id,
            issued_at: now,
            expires_at: now + REFRESH_TOKEN_TTL,
            revoked_at: None,
            replaced_by: None,
        };
        self.repo.insert_refresh_token(refresh_token.clone()).await?;

        let access_token = jwt::encode_access_token(
            user.id,
            &user.email,
            now,
            &self.signing_key,
            &self.issuer,
            &self.audience,
        )?;
        Ok(TokenPair {
            access_token,
            refresh_token: refresh_token.token,
        })
    }
}

/// 256 bits of randomness from two concatenated v4 UUIDs, hex-encoded
/// without hyphens. Avoids pulling in a base64 dependency for a value that
/// is never decoded, only compared.
fn generate_opaque_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryAuthRepository;
    use auction_domain::clock::FixedClock;
    use chrono::Utc;

    fn service() -> AuthService {
        AuthService::new(
            Arc::new(InMemoryAuthRepository::new()),
            Arc::new(FixedClock::new(Utc::now())),
            "a-signing-key-at-least-32-bytes!".to_string(),
            "bidup".to_string(),
            "bidup-clients".to_string(),
        )
    }

    #[tokio::test]
    async fn register_then_login_succeeds() {
        let service = service();
        service
            .register("a@example.com", "hunter22222", "Ada")
            .await
            .unwrap();
        let pair = service.login("a@example.com", "hunter22222").await.unwrap();
        assert!(!pair.access_token.is_empty());
        assert!(!pair.refresh_token.is_empty());
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let service = service();
        service.register("a@example.com", "hunter22222", "Ada").await.unwrap();
        let err = service
            .register("a@example.com", "hunter22222", "Ada")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken));
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let service = service();
        service.register("a@example.com", "hunter22222", "Ada").await.unwrap();
        let err = service.login("a@example.com", "wrong-password").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn refresh_rotates_token() {
        let service = service();
        service.register("a@example.com", "hunter22222", "Ada").await.unwrap();
        let first = service.login("a@example.com", "hunter22222").await.unwrap();
        let second = service.refresh(&first.refresh_token).await.unwrap();
        assert_ne!(first.refresh_token, second.refresh_token);
    }

    #[tokio::test]
    async fn replaying_a_rotated_token_revokes_the_family() {
        let service = service();
        service.register("a@example.com", "hunter22222", "Ada").await.unwrap();
        let first = service.login("a@example.com", "hunter22222").await.unwrap();
        let second = service.refresh(&first.refresh_token).await.unwrap();

        let err = service.refresh(&first.refresh_token).await.unwrap_err();
        assert!(matches!(err, AuthError::ReuseDetected));

        let err = service.refresh(&second.refresh_token).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidRefreshToken) || matches!(err, AuthError::ReuseDetected));
    }

    #[tokio::test]
    async fn logout_only_revokes_presented_token() {
        let service = service();
        service.register("a@example.com", "hunter22222", "Ada").await.unwrap();
        let pair = service.login("a@example.com", "hunter22222").await.unwrap();
        service.logout(&pair.refresh_token).await.unwrap();
        let err = service.refresh(&pair.refresh_token).await.unwrap_err();
        assert!(matches!(err, AuthError::ReuseDetected));
    }
}
