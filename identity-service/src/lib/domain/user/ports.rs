use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

use crate::domain::errors::RepositoryError;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;

/// Persistence operations for the user aggregate.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Persist new user to storage.
    ///
    /// # Errors
    /// * `UniqueViolation` - Email is already registered
    /// * `Database` - Storage operation failed
    async fn create(&self, user: User) -> Result<User, RepositoryError>;

    /// Retrieve user by identifier, active or not.
    ///
    /// # Returns
    /// Optional user entity (None if not found)
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError>;

    /// Retrieve an active user by normalized email.
    ///
    /// # Returns
    /// Optional user entity (None if unknown or deactivated)
    async fn find_active_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, RepositoryError>;

    /// Record a successful sign-in.
    ///
    /// Sets `last_login_at` and `updated_at` to `at`.
    async fn record_login(&self, id: &UserId, at: DateTime<Utc>) -> Result<(), RepositoryError>;
}
