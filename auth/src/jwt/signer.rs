use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::AccessClaims;
use super::claims::TokenSubject;
use super::errors::JwtError;

/// Settings required to sign and verify access tokens.
#[derive(Debug, Clone)]
pub struct SignerSettings {
    pub secret: String,
    pub audience: String,
    pub issuer: String,
}

/// Signs and verifies access tokens.
///
/// Uses HS256 (HMAC with SHA-256) with a server-held secret. Tokens are
/// stateless: nothing is recorded server-side, so an issued token stays valid
/// until it expires.
pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    validation: Validation,
    audience: String,
    issuer: String,
}

impl TokenSigner {
    /// Create a signer from settings.
    ///
    /// # Arguments
    /// * `settings` - Secret, audience and issuer
    ///
    /// # Errors
    /// * `MissingSecret` - Secret is empty or whitespace
    ///
    /// # Security Notes
    /// - The secret should be at least 256 bits (32 bytes) for HS256
    /// - Store secrets in environment variables or secure vaults, never in code
    pub fn new(settings: &SignerSettings) -> Result<Self, JwtError> {
        if settings.secret.trim().is_empty() {
            return Err(JwtError::MissingSecret);
        }

        let algorithm = Algorithm::HS256;
        let secret = settings.secret.as_bytes();

        let mut validation = Validation::new(algorithm);
        validation.leeway = 0;
        validation.set_audience(&[&settings.audience]);
        validation.set_issuer(&[&settings.issuer]);
        validation.set_required_spec_claims(&["exp", "sub", "aud", "iss"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm,
            validation,
            audience: settings.audience.clone(),
            issuer: settings.issuer.clone(),
        })
    }

    /// Sign an access token for a subject.
    ///
    /// # Arguments
    /// * `subject` - Identity to embed (id, email, display name)
    /// * `ttl_seconds` - Token lifetime in seconds
    ///
    /// # Returns
    /// Compact JWT string
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn sign(&self, subject: &TokenSubject, ttl_seconds: i64) -> Result<String, JwtError> {
        let claims = AccessClaims::new(subject, ttl_seconds, &self.audience, &self.issuer);

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Verify a token and return its claims.
    ///
    /// Checks signature, expiry, audience and issuer.
    ///
    /// # Errors
    /// * `InvalidToken` - Any check failed
    pub fn verify(&self, token: &str) -> Result<AccessClaims, JwtError> {
        decode::<AccessClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| JwtError::InvalidToken)
    }
}
