use std::sync::Arc;

use async_trait::async_trait;
use auth::PasswordHasher;
use auth::TokenSigner;
use auth::TokenSubject;
use chrono::Duration;
use chrono::Utc;
use tokio::sync::OnceCell;

use crate::domain::credentials::errors::CredentialError;
use crate::domain::credentials::models::DeviceInfo;
use crate::domain::credentials::models::LogoutAllOutcome;
use crate::domain::credentials::models::LogoutOutcome;
use crate::domain::credentials::models::NewRefreshToken;
use crate::domain::credentials::models::RefreshTokenHash;
use crate::domain::credentials::models::SignInCommand;
use crate::domain::credentials::models::SignUpCommand;
use crate::domain::credentials::models::SignUpOutcome;
use crate::domain::credentials::models::TokenLifetimes;
use crate::domain::credentials::models::TokenPair;
use crate::domain::credentials::ports::CredentialServicePort;
use crate::domain::credentials::ports::RefreshTokenRepository;
use crate::domain::errors::RepositoryError;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::ports::UserRepository;

/// Domain service implementation for the credential lifecycle.
///
/// Sole writer of users and refresh tokens. Generic over both persistence
/// ports and the password hashing algorithm.
pub struct CredentialService<UR, TR, PH>
where
    UR: UserRepository,
    TR: RefreshTokenRepository,
    PH: PasswordHasher,
{
    users: Arc<UR>,
    refresh_tokens: Arc<TR>,
    password_hasher: Arc<PH>,
    token_signer: Arc<TokenSigner>,
    lifetimes: TokenLifetimes,
    // Hash verified against when no usable account matches a sign-in
    dummy_hash: OnceCell<String>,
}

const DUMMY_PASSWORD: &str = "dummy-password-for-unknown-accounts";

impl<UR, TR, PH> CredentialService<UR, TR, PH>
where
    UR: UserRepository,
    TR: RefreshTokenRepository,
    PH: PasswordHasher,
{
    /// Create a new credential service with injected dependencies.
    ///
    /// # Arguments
    /// * `users` - User persistence implementation
    /// * `refresh_tokens` - Refresh token persistence implementation
    /// * `password_hasher` - Password hashing algorithm
    /// * `token_signer` - Access token signer
    /// * `lifetimes` - Access and refresh token TTLs
    pub fn new(
        users: Arc<UR>,
        refresh_tokens: Arc<TR>,
        password_hasher: Arc<PH>,
        token_signer: Arc<TokenSigner>,
        lifetimes: TokenLifetimes,
    ) -> Self {
        Self {
            users,
            refresh_tokens,
            password_hasher,
            token_signer,
            lifetimes,
            dummy_hash: OnceCell::new(),
        }
    }

    async fn hash_password(&self, password: String) -> Result<String, CredentialError> {
        let hasher = Arc::clone(&self.password_hasher);

        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| {
                CredentialError::RegistrationFailed(format!("Hashing task failed: {}", e))
            })?
            .map_err(|e| CredentialError::RegistrationFailed(e.to_string()))
    }

    async fn verify_password(&self, password: String, hash: String) -> Result<bool, CredentialError> {
        let hasher = Arc::clone(&self.password_hasher);

        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| {
                CredentialError::OperationFailed(format!("Verification task failed: {}", e))
            })
    }

    async fn generate_tokens(
        &self,
        user: &User,
        device: DeviceInfo,
    ) -> Result<TokenPair, CredentialError> {
        let subject = TokenSubject::new(user.id, user.email.as_str(), user.name.as_str());
        let access_token = self
            .token_signer
            .sign(&subject, self.lifetimes.access_ttl_seconds)
            .map_err(|e| {
                tracing::error!(user_id = %user.id, error = %e, "Access token signing failed");
                CredentialError::OperationFailed(e.to_string())
            })?;

        let secret = auth::refresh::generate_secret();
        let refresh_expires_at = Utc::now() + Duration::seconds(self.lifetimes.refresh_ttl_seconds);

        let stored = self
            .refresh_tokens
            .issue(NewRefreshToken {
                user_id: user.id,
                token_hash: RefreshTokenHash::from_secret(&secret),
                expires_at: refresh_expires_at,
                device,
            })
            .await
            .map_err(operation_failed("Refresh token insert failed"))?;

        tracing::debug!(
            user_id = %user.id,
            refresh_token_id = %stored.id,
            expires_at = %refresh_expires_at,
            "Refresh token issued"
        );

        Ok(TokenPair {
            access_token,
            refresh_token: secret,
            refresh_expires_at,
        })
    }
}

fn operation_failed(context: &'static str) -> impl Fn(RepositoryError) -> CredentialError {
    move |e| {
        tracing::error!(error = %e, "{}", context);
        CredentialError::OperationFailed(format!("{}: {}", context, e))
    }
}

#[async_trait]
impl<UR, TR, PH> CredentialServicePort for CredentialService<UR, TR, PH>
where
    UR: UserRepository,
    TR: RefreshTokenRepository,
    PH: PasswordHasher,
{
    #[tracing::instrument(skip_all, fields(email = %command.email))]
    async fn sign_up(&self, command: SignUpCommand) -> Result<SignUpOutcome, CredentialError> {
        let password_hash = self
            .hash_password(command.password.expose().to_string())
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, "Password hashing failed");
                e
            })?;

        let user = User::new(command.email, command.name, password_hash);

        let created = self.users.create(user).await.map_err(|e| match e {
            RepositoryError::UniqueViolation(_) => {
                tracing::warn!("Registration failed - email already exists");
                CredentialError::DuplicateEmail
            }
            RepositoryError::Database(detail) => {
                tracing::error!(error = %detail, "Registration failed");
                CredentialError::RegistrationFailed(detail)
            }
        })?;

        tracing::info!(user_id = %created.id, "User registered successfully");

        Ok(SignUpOutcome {
            message: "User created successfully".to_string(),
            user_id: created.id,
        })
    }

    #[tracing::instrument(skip_all, fields(email = %command.email))]
    async fn sign_in(
        &self,
        command: SignInCommand,
        device: DeviceInfo,
    ) -> Result<TokenPair, CredentialError> {
        let user = self
            .users
            .find_active_by_email(&command.email)
            .await
            .map_err(operation_failed("User lookup failed"))?
            .filter(|user| user.is_active);

        let Some(user) = user else {
            // Spend the same Argon2 work as a wrong password
            let dummy = self
                .dummy_hash
                .get_or_try_init(|| self.hash_password(DUMMY_PASSWORD.to_string()))
                .await;
            if let Ok(dummy) = dummy {
                let _ = self.verify_password(command.password, dummy.clone()).await;
            }
            tracing::warn!("Sign-in failed - user not found or inactive");
            return Err(CredentialError::InvalidCredentials);
        };

        let password_matches = self
            .verify_password(command.password, user.password_hash.clone())
            .await?;
        if !password_matches {
            tracing::warn!(user_id = %user.id, "Sign-in failed - invalid password");
            return Err(CredentialError::InvalidCredentials);
        }

        self.users
            .record_login(&user.id, Utc::now())
            .await
            .map_err(operation_failed("Recording last login failed"))?;

        let tokens = self.generate_tokens(&user, device).await?;

        tracing::info!(user_id = %user.id, "User signed in successfully");

        Ok(tokens)
    }

    #[tracing::instrument(skip_all)]
    async fn refresh(
        &self,
        secret: &str,
        device: DeviceInfo,
    ) -> Result<TokenPair, CredentialError> {
        if secret.is_empty() {
            tracing::warn!("Refresh token is empty");
            return Err(CredentialError::InvalidRefreshToken);
        }

        // Lookup and revocation happen in one conditional update, so a
        // replayed secret loses the race even under concurrent requests.
        let consumed = self
            .refresh_tokens
            .consume_active(&RefreshTokenHash::from_secret(secret), Utc::now())
            .await
            .map_err(operation_failed("Refresh token consumption failed"))?
            .ok_or_else(|| {
                tracing::warn!("Invalid or expired refresh token used");
                CredentialError::InvalidRefreshToken
            })?;

        let user = self
            .users
            .find_by_id(&consumed.user_id)
            .await
            .map_err(operation_failed("User lookup failed"))?
            .filter(|user| user.is_active)
            .ok_or_else(|| {
                tracing::warn!(user_id = %consumed.user_id, "Refresh denied - user account is not active");
                CredentialError::UserInactive
            })?;

        let tokens = self.generate_tokens(&user, device).await?;

        tracing::info!(
            user_id = %user.id,
            rotated_token_id = %consumed.id,
            "Tokens refreshed successfully"
        );

        Ok(tokens)
    }

    #[tracing::instrument(skip_all)]
    async fn logout(&self, secret: &str) -> Result<LogoutOutcome, CredentialError> {
        let outcome = LogoutOutcome {
            message: "Logged out successfully".to_string(),
            clear_cookie: true,
        };

        if secret.is_empty() {
            return Ok(outcome);
        }

        let now = Utc::now();
        let active = self
            .refresh_tokens
            .find_active_by_hash(&RefreshTokenHash::from_secret(secret), now)
            .await
            .map_err(operation_failed("Logout lookup failed"))?;

        match active {
            Some(token) => {
                self.refresh_tokens
                    .revoke(&token.id, now)
                    .await
                    .map_err(operation_failed("Logout revoke failed"))?;
                tracing::info!(user_id = %token.user_id, "User logged out successfully");
            }
            None => tracing::debug!("No active refresh token matched, already logged out"),
        }

        Ok(outcome)
    }

    #[tracing::instrument(skip_all, fields(user_id = %user_id))]
    async fn logout_all(&self, user_id: &UserId) -> Result<LogoutAllOutcome, CredentialError> {
        let revoked = self
            .refresh_tokens
            .revoke_all_for_user(user_id, Utc::now())
            .await
            .map_err(operation_failed("Logout from all devices failed"))?;

        tracing::info!(devices = revoked, "User logged out from all devices");

        Ok(LogoutAllOutcome {
            message: format!("Logged out from {} devices", revoked),
            revoked,
        })
    }

    async fn purge_expired_refresh_tokens(&self) -> Result<u64, CredentialError> {
        let purged = self
            .refresh_tokens
            .purge_expired(Utc::now())
            .await
            .map_err(operation_failed("Expired refresh token purge failed"))?;

        if purged > 0 {
            tracing::info!(purged, "Expired refresh tokens purged");
        }

        Ok(purged)
    }
}
