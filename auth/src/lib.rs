//! Authentication utilities library
//!
//! Provides the credential primitives used by the identity service:
//! - Password hashing (Argon2id) behind the `PasswordHasher` trait
//! - Access token signing and verification (HS256 JWT)
//! - Refresh token secret generation and hashing (SHA-256)
//!
//! Nothing in this crate performs I/O; persistence and orchestration live in
//! the service that uses it.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::{Argon2Hasher, PasswordHasher};
//!
//! let hasher = Argon2Hasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash));
//! assert!(!hasher.verify("not_my_password", &hash));
//! ```
//!
//! ## Access Tokens
//! ```
//! use auth::{SignerSettings, TokenSigner, TokenSubject};
//!
//! let signer = TokenSigner::new(&SignerSettings {
//!     secret: "secret_key_at_least_32_bytes_long!".to_string(),
//!     audience: "web".to_string(),
//!     issuer: "identity".to_string(),
//! })
//! .unwrap();
//!
//! let subject = TokenSubject::new("user123", "ann@example.com", "Ann Lee");
//! let token = signer.sign(&subject, 900).unwrap();
//! let claims = signer.verify(&token).unwrap();
//! assert_eq!(claims.sub, "user123");
//! ```
//!
//! ## Refresh Secrets
//! ```
//! let secret = auth::refresh::generate_secret();
//! let stored = auth::refresh::hash_secret(&secret);
//! assert_ne!(secret, stored);
//! ```

pub mod jwt;
pub mod password;
pub mod refresh;

// Re-export commonly used items
pub use jwt::AccessClaims;
pub use jwt::JwtError;
pub use jwt::SignerSettings;
pub use jwt::TokenSigner;
pub use jwt::TokenSubject;
pub use password::Argon2Hasher;
pub use password::PasswordError;
pub use password::PasswordHasher;
