use std::fmt;

use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::user::models::DisplayName;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::Password;
use crate::domain::user::models::UserId;

/// Refresh token row identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RefreshTokenId(pub Uuid);

impl RefreshTokenId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RefreshTokenId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RefreshTokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// SHA-256 digest (hex) of a refresh secret.
///
/// The only representation of a refresh token that reaches storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RefreshTokenHash(String);

impl RefreshTokenHash {
    /// Hash a plaintext secret presented by a client.
    pub fn from_secret(secret: &str) -> Self {
        Self(auth::refresh::hash_secret(secret))
    }

    /// Wrap a digest read back from storage.
    pub fn from_stored(hash: String) -> Self {
        Self(hash)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Client device metadata captured at sign-in and refresh.
///
/// Best effort and unauthenticated: taken verbatim from request headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceInfo {
    pub user_agent: Option<String>,
    pub ip: Option<String>,
}

impl DeviceInfo {
    pub fn new(user_agent: Option<String>, ip: Option<String>) -> Self {
        Self { user_agent, ip }
    }
}

/// Persisted refresh token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshToken {
    pub id: RefreshTokenId,
    pub user_id: UserId,
    pub token_hash: RefreshTokenHash,
    pub expires_at: DateTime<Utc>,
    pub device: DeviceInfo,
    pub revoked: bool,
    pub revoked_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RefreshToken {
    /// A token is usable iff it is not revoked and has not expired.
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && self.expires_at > now
    }
}

/// Refresh token to be inserted by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRefreshToken {
    pub user_id: UserId,
    pub token_hash: RefreshTokenHash,
    pub expires_at: DateTime<Utc>,
    pub device: DeviceInfo,
}

impl NewRefreshToken {
    /// Materialize the row with a fresh id and timestamps.
    pub fn into_token(self, now: DateTime<Utc>) -> RefreshToken {
        RefreshToken {
            id: RefreshTokenId::new(),
            user_id: self.user_id,
            token_hash: self.token_hash,
            expires_at: self.expires_at,
            device: self.device,
            revoked: false,
            revoked_at: None,
            last_used_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Access and refresh token lifetimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenLifetimes {
    pub access_ttl_seconds: i64,
    pub refresh_ttl_seconds: i64,
}

/// Command to register a new user
#[derive(Debug)]
pub struct SignUpCommand {
    pub email: EmailAddress,
    pub name: DisplayName,
    pub password: Password,
}

impl SignUpCommand {
    pub fn new(email: EmailAddress, name: DisplayName, password: Password) -> Self {
        Self {
            email,
            name,
            password,
        }
    }
}

/// Command to authenticate with email and password
pub struct SignInCommand {
    pub email: EmailAddress,
    pub password: String,
}

impl SignInCommand {
    pub fn new(email: EmailAddress, password: String) -> Self {
        Self { email, password }
    }
}

impl fmt::Debug for SignInCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignInCommand")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpOutcome {
    pub message: String,
    pub user_id: UserId,
}

/// Freshly issued credentials.
///
/// `refresh_token` is the plaintext secret; this is the only place it exists
/// server-side and it must be handed to the client, not stored.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub refresh_expires_at: DateTime<Utc>,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("refresh_expires_at", &self.refresh_expires_at)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoutOutcome {
    pub message: String,
    /// Always true: the boundary must drop the refresh cookie.
    pub clear_cookie: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoutAllOutcome {
    pub message: String,
    pub revoked: u64,
}
