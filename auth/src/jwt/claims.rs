use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Identity carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSubject {
    /// User identifier, stored in the `sub` claim
    pub subject: String,
    pub email: String,
    /// Display name
    pub name: String,
}

impl TokenSubject {
    pub fn new(subject: impl ToString, email: impl ToString, name: impl ToString) -> Self {
        Self {
            subject: subject.to_string(),
            email: email.to_string(),
            name: name.to_string(),
        }
    }
}

/// Access token payload.
///
/// Standard RFC 7519 claims plus the user's email and display name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessClaims {
    /// Subject (user identifier)
    pub sub: String,

    pub email: String,

    pub name: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Audience
    pub aud: String,

    /// Issuer
    pub iss: String,
}

impl AccessClaims {
    /// Build claims for a subject, expiring `ttl_seconds` from now.
    ///
    /// # Arguments
    /// * `subject` - Identity to embed
    /// * `ttl_seconds` - Lifetime in seconds (a negative value yields an already expired token)
    /// * `audience` - Intended recipient of the token
    /// * `issuer` - Token issuer
    pub fn new(subject: &TokenSubject, ttl_seconds: i64, audience: &str, issuer: &str) -> Self {
        let now = Utc::now();
        let expiration = now + Duration::seconds(ttl_seconds);

        Self {
            sub: subject.subject.clone(),
            email: subject.email.clone(),
            name: subject.name.clone(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            aud: audience.to_string(),
            iss: issuer.to_string(),
        }
    }
}
