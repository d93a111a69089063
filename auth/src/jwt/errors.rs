use thiserror::Error;

/// Error type for JWT operations.
///
/// Verification failures are deliberately collapsed into `InvalidToken` so
/// callers cannot tell which check rejected the token.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JwtError {
    #[error("Signing secret is missing")]
    MissingSecret,

    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),

    #[error("Invalid token")]
    InvalidToken,
}
