//! In-process repositories backed by tokio locks.
//!
//! Used by the HTTP scenario tests and for running the service without a
//! database. Each store guards all of its state with one lock, so the
//! check-and-set in `consume_active` is atomic.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use tokio::sync::Mutex;
use tokio::sync::RwLock;

use crate::domain::credentials::models::NewRefreshToken;
use crate::domain::credentials::models::RefreshToken;
use crate::domain::credentials::models::RefreshTokenHash;
use crate::domain::credentials::models::RefreshTokenId;
use crate::domain::credentials::ports::RefreshTokenRepository;
use crate::domain::errors::RepositoryError;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::ports::UserRepository;

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the active flag of a stored user.
    ///
    /// # Returns
    /// `false` if the user does not exist
    pub async fn set_active(&self, id: &UserId, active: bool) -> bool {
        let mut users = self.users.write().await;
        match users.get_mut(id) {
            Some(user) => {
                user.is_active = active;
                user.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> Result<User, RepositoryError> {
        let mut users = self.users.write().await;

        if users.values().any(|u| u.email == user.email) {
            return Err(RepositoryError::UniqueViolation(
                "users_email_key".to_string(),
            ));
        }

        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_active_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| &u.email == email && u.is_active)
            .cloned())
    }

    async fn record_login(&self, id: &UserId, at: DateTime<Utc>) -> Result<(), RepositoryError> {
        if let Some(user) = self.users.write().await.get_mut(id) {
            user.last_login_at = Some(at);
            user.updated_at = at;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryRefreshTokenRepository {
    tokens: Mutex<HashMap<RefreshTokenHash, RefreshToken>>,
}

impl InMemoryRefreshTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored token, revoked ones included.
    pub async fn all(&self) -> Vec<RefreshToken> {
        self.tokens.lock().await.values().cloned().collect()
    }
}

#[async_trait]
impl RefreshTokenRepository for InMemoryRefreshTokenRepository {
    async fn issue(&self, token: NewRefreshToken) -> Result<RefreshToken, RepositoryError> {
        let mut tokens = self.tokens.lock().await;

        if tokens.contains_key(&token.token_hash) {
            return Err(RepositoryError::UniqueViolation(
                "refresh_tokens_token_hash_key".to_string(),
            ));
        }

        let token = token.into_token(Utc::now());
        tokens.insert(token.token_hash.clone(), token.clone());
        Ok(token)
    }

    async fn find_active_by_hash(
        &self,
        hash: &RefreshTokenHash,
        now: DateTime<Utc>,
    ) -> Result<Option<RefreshToken>, RepositoryError> {
        Ok(self
            .tokens
            .lock()
            .await
            .get(hash)
            .filter(|t| t.is_usable(now))
            .cloned())
    }

    async fn consume_active(
        &self,
        hash: &RefreshTokenHash,
        now: DateTime<Utc>,
    ) -> Result<Option<RefreshToken>, RepositoryError> {
        let mut tokens = self.tokens.lock().await;

        let Some(token) = tokens.get_mut(hash).filter(|t| t.is_usable(now)) else {
            return Ok(None);
        };

        token.revoked = true;
        token.revoked_at = Some(now);
        token.last_used_at = Some(now);
        token.updated_at = now;

        Ok(Some(token.clone()))
    }

    async fn revoke(&self, id: &RefreshTokenId, at: DateTime<Utc>) -> Result<(), RepositoryError> {
        let mut tokens = self.tokens.lock().await;

        if let Some(token) = tokens.values_mut().find(|t| &t.id == id && !t.revoked) {
            token.revoked = true;
            token.revoked_at = Some(at);
            token.updated_at = at;
        }
        Ok(())
    }

    async fn revoke_all_for_user(
        &self,
        user_id: &UserId,
        at: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let mut tokens = self.tokens.lock().await;
        let mut revoked = 0;

        for token in tokens
            .values_mut()
            .filter(|t| &t.user_id == user_id && !t.revoked)
        {
            token.revoked = true;
            token.revoked_at = Some(at);
            token.updated_at = at;
            revoked += 1;
        }

        Ok(revoked)
    }

    async fn purge_expired(&self, before: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let mut tokens = self.tokens.lock().await;
        let count = tokens.len();

        tokens.retain(|_, t| t.expires_at >= before);

        Ok((count - tokens.len()) as u64)
    }
}
