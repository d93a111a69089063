use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::user::errors::DisplayNameError;
use crate::domain::user::errors::EmailError;
use crate::domain::user::errors::PasswordPolicyError;
use crate::domain::user::errors::UserIdError;

/// User aggregate entity.
///
/// Represents a registered account. The password hash is never rendered by
/// `Debug` so users can be logged safely.
#[derive(Clone)]
pub struct User {
    pub id: UserId,
    pub email: EmailAddress,
    pub name: DisplayName,
    pub password_hash: String,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new active user that has never signed in.
    ///
    /// # Arguments
    /// * `email` - Normalized email address
    /// * `name` - Display name
    /// * `password_hash` - Hash produced by the password hasher
    pub fn new(email: EmailAddress, name: DisplayName, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new(),
            email,
            name,
            password_hash,
            is_active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("name", &self.name)
            .field("password_hash", &"<redacted>")
            .field("is_active", &self.is_active)
            .field("last_login_at", &self.last_login_at)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// User unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Generate a new random user ID.
    ///
    /// # Returns
    /// UserId with random UUID v4
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a user ID from string.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, UserIdError> {
        Uuid::parse_str(s)
            .map(UserId)
            .map_err(|e| UserIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Trimmed and lower-cased on construction so that uniqueness and lookups
/// are case-insensitive. Format is validated with an RFC 5322 parser.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Longest address accepted by SMTP (RFC 5321)
    const MAX_LENGTH: usize = 254;

    /// Create a new validated, normalized email address.
    ///
    /// # Errors
    /// * `TooLong` - Longer than 254 characters
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: String) -> Result<Self, EmailError> {
        let normalized = email.trim().to_lowercase();
        let length = normalized.chars().count();
        if length > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            });
        }

        email_address::EmailAddress::from_str(&normalized)
            .map(|_| EmailAddress(normalized))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Display name value type
///
/// Trimmed; 3 to 100 characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayName(String);

impl DisplayName {
    const MIN_LENGTH: usize = 3;
    const MAX_LENGTH: usize = 100;

    /// Create a new valid display name.
    ///
    /// # Errors
    /// * `TooShort` - Fewer than 3 characters after trimming
    /// * `TooLong` - More than 100 characters after trimming
    pub fn new(name: String) -> Result<Self, DisplayNameError> {
        let name = name.trim().to_string();
        let length = name.chars().count();
        if length < Self::MIN_LENGTH {
            Err(DisplayNameError::TooShort {
                min: Self::MIN_LENGTH,
                actual: length,
            })
        } else if length > Self::MAX_LENGTH {
            Err(DisplayNameError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            })
        } else {
            Ok(Self(name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Plaintext password accepted at sign-up.
///
/// Enforces a length policy only; it is hashed by the credential service and
/// never stored. `Debug` does not print the value.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    const MIN_LENGTH: usize = 8;
    const MAX_LENGTH: usize = 128;

    /// # Errors
    /// * `TooShort` - Fewer than 8 characters
    /// * `TooLong` - More than 128 characters
    pub fn new(password: String) -> Result<Self, PasswordPolicyError> {
        let length = password.chars().count();
        if length < Self::MIN_LENGTH {
            Err(PasswordPolicyError::TooShort {
                min: Self::MIN_LENGTH,
                actual: length,
            })
        } else if length > Self::MAX_LENGTH {
            Err(PasswordPolicyError::TooLong {
                max: Self::MAX_LENGTH,
            })
        } else {
            Ok(Self(password))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}
