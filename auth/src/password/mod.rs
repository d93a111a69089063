pub mod argon2;
pub mod errors;

pub use self::argon2::Argon2Hasher;
pub use errors::PasswordError;

/// One-way password hashing capability.
///
/// Services depend on this trait rather than on a concrete algorithm so the
/// hashing scheme can be swapped without touching the callers.
pub trait PasswordHasher: Send + Sync + 'static {
    /// Hash a plaintext password for storage.
    ///
    /// The returned string embeds the salt and the algorithm parameters.
    ///
    /// # Errors
    /// * `HashingFailed` - Hashing operation failed
    fn hash(&self, password: &str) -> Result<String, PasswordError>;

    /// Check a plaintext password against a stored hash.
    ///
    /// Never fails: a mismatch or a malformed stored hash both yield `false`.
    fn verify(&self, password: &str, hash: &str) -> bool;
}
