//! In-memory [`AuthRepository`] used by this crate's own tests and by
//! `auction-api` integration tests that don't want a live database.

use crate::error::AuthResult;
use crate::repository::{AuthRepository, RefreshToken, User};
use async_trait::async_trait;
use auction_domain::UserId;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    users: HashMap<UserId, User>,
    refresh_tokens: HashMap<String, RefreshToken>,
}

#[derive(Default)]
pub struct InMemoryAuthRepository {
    inner: Mutex<Inner>,
}

impl InMemoryAuthRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuthRepository for InMemoryAuthRepository {
    async fn create_user(&self, user: User) -> AuthResult<User> {
        let mut inner = self.inner.lock().unwrap();
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: UserId) -> AuthResult<Option<User>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.get(&id).cloned())
    }

    async fn insert_refresh_token(&self, token: RefreshToken) -> AuthResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.refresh_tokens.insert(token.token.clone(), token);
        Ok(())
    }

    async fn find_refresh_token(&self, token: &str) -> AuthResult<Option<RefreshToken>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.refresh_tokens.get(token).cloned())
    }

    async fn rotate_refresh_token(&self, old_token: &str, new: RefreshToken) -> AuthResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(old) = inner.refresh_tokens.get_mut(old_token) {
            old.revoked_at = Some(new.issued_at);
            old.replaced_by = Some(new.token.clone());
        }
        inner.refresh_tokens.insert(new.token.clone(), new);
        Ok(())
    }

    async fn revoke_refresh_token(&self, token: &str, at: DateTime<Utc>) -> AuthResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(existing) = inner.refresh_tokens.get_mut(token) {
            if existing.revoked_at.is_none() {
                existing.revoked_at = Some(at);
            }
        }
        Ok(())
    }

    async fn revoke_family(&self, family_id: Uuid, at: DateTime<Utc>) -> AuthResult<()> {
        let mut inner = self.inner.lock().unwrap();
        for token in inner.refresh_tokens.values_mut() {
            if token.family_id == family_id && token.revoked_at.is_none() {
                token.revoked_at = Some(at);
            }
        }
        Ok(())
    }
}
