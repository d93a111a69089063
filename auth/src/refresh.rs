use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Digest;
use sha2::Sha256;

/// Number of random bytes in a refresh secret (256 bits).
pub const SECRET_BYTES: usize = 32;

/// Generate a new opaque refresh token secret.
///
/// Returns 32 bytes from the operating system CSPRNG, hex encoded
/// (64 characters). This plaintext is handed to the client once; the server
/// keeps only its digest.
pub fn generate_secret() -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// SHA-256 digest of a refresh secret, hex encoded.
///
/// This is the only form in which a refresh secret is stored or looked up.
pub fn hash_secret(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}
