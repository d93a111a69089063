use thiserror::Error;

/// Failures of the credential lifecycle operations.
///
/// Display strings are the messages shown to clients. Internal variants keep
/// their detail in the payload for server-side logs only.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("Email already exists")]
    DuplicateEmail,

    /// Unknown email, inactive account and wrong password all map here.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Missing, unknown, expired or revoked refresh token.
    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("User account is not active")]
    UserInactive,

    #[error("Registration failed")]
    RegistrationFailed(String),

    #[error("Operation failed")]
    OperationFailed(String),
}
