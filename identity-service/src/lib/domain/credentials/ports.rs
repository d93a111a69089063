use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

use crate::domain::credentials::errors::CredentialError;
use crate::domain::credentials::models::DeviceInfo;
use crate::domain::credentials::models::LogoutAllOutcome;
use crate::domain::credentials::models::LogoutOutcome;
use crate::domain::credentials::models::NewRefreshToken;
use crate::domain::credentials::models::RefreshToken;
use crate::domain::credentials::models::RefreshTokenHash;
use crate::domain::credentials::models::RefreshTokenId;
use crate::domain::credentials::models::SignInCommand;
use crate::domain::credentials::models::SignUpCommand;
use crate::domain::credentials::models::SignUpOutcome;
use crate::domain::credentials::models::TokenPair;
use crate::domain::errors::RepositoryError;
use crate::domain::user::models::UserId;

/// Port for credential lifecycle operations.
#[async_trait]
pub trait CredentialServicePort: Send + Sync + 'static {
    /// Register a new user. Issues no tokens.
    ///
    /// # Errors
    /// * `DuplicateEmail` - Email is already registered
    /// * `RegistrationFailed` - Hashing or storage failed
    async fn sign_up(&self, command: SignUpCommand) -> Result<SignUpOutcome, CredentialError>;

    /// Authenticate with email and password and open a new session.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown email, inactive account or wrong password
    /// * `OperationFailed` - Storage or signing failed
    async fn sign_in(
        &self,
        command: SignInCommand,
        device: DeviceInfo,
    ) -> Result<TokenPair, CredentialError>;

    /// Exchange a refresh secret for a new token pair.
    ///
    /// The presented secret is revoked before anything else happens and can
    /// never be used again, even if issuing the new pair fails.
    ///
    /// # Errors
    /// * `InvalidRefreshToken` - Empty, unknown, expired or revoked secret
    /// * `UserInactive` - Owner no longer exists or is deactivated
    /// * `OperationFailed` - Storage or signing failed
    async fn refresh(&self, secret: &str, device: DeviceInfo)
        -> Result<TokenPair, CredentialError>;

    /// Close the session bound to a refresh secret.
    ///
    /// An unknown or already revoked secret is treated as logged out.
    ///
    /// # Errors
    /// * `OperationFailed` - Storage failed
    async fn logout(&self, secret: &str) -> Result<LogoutOutcome, CredentialError>;

    /// Revoke every active session of a user.
    ///
    /// # Errors
    /// * `OperationFailed` - Storage failed
    async fn logout_all(&self, user_id: &UserId) -> Result<LogoutAllOutcome, CredentialError>;

    /// Delete refresh tokens that expired before now.
    ///
    /// # Returns
    /// Number of rows removed
    async fn purge_expired_refresh_tokens(&self) -> Result<u64, CredentialError>;
}

/// Persistence operations for refresh tokens.
///
/// Keyed by the secret's hash; implementations never receive a plaintext secret.
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync + 'static {
    /// Insert a new, unrevoked token.
    ///
    /// # Errors
    /// * `UniqueViolation` - Hash already stored
    /// * `Database` - Storage operation failed
    async fn issue(&self, token: NewRefreshToken) -> Result<RefreshToken, RepositoryError>;

    /// Find a token that is unrevoked and unexpired at `now`.
    async fn find_active_by_hash(
        &self,
        hash: &RefreshTokenHash,
        now: DateTime<Utc>,
    ) -> Result<Option<RefreshToken>, RepositoryError>;

    /// Atomically revoke a token if it is active at `now`.
    ///
    /// Sets `revoked`, `revoked_at` and `last_used_at`. Among concurrent
    /// callers presenting the same hash at most one receives `Some`.
    ///
    /// # Returns
    /// The consumed token, or None if no active token matched
    async fn consume_active(
        &self,
        hash: &RefreshTokenHash,
        now: DateTime<Utc>,
    ) -> Result<Option<RefreshToken>, RepositoryError>;

    /// Revoke a single token.
    async fn revoke(&self, id: &RefreshTokenId, at: DateTime<Utc>) -> Result<(), RepositoryError>;

    /// Revoke all unrevoked tokens of a user.
    ///
    /// # Returns
    /// Number of tokens that changed state
    async fn revoke_all_for_user(
        &self,
        user_id: &UserId,
        at: DateTime<Utc>,
    ) -> Result<u64, RepositoryError>;

    /// Delete tokens whose expiry is before `before`.
    ///
    /// # Returns
    /// Number of tokens deleted
    async fn purge_expired(&self, before: DateTime<Utc>) -> Result<u64, RepositoryError>;
}
