pub mod claims;
pub mod errors;
pub mod signer;

pub use claims::AccessClaims;
pub use claims::TokenSubject;
pub use errors::JwtError;
pub use signer::SignerSettings;
pub use signer::TokenSigner;
