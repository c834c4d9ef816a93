//! Cryptographic utilities: password hashing and reset tokens

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Default bcrypt cost factor
pub const BCRYPT_COST: u32 = 12;

/// Number of random bytes in a password-reset token
pub const RESET_TOKEN_BYTES: usize = 32;

/// Hash a password with bcrypt
pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, BCRYPT_COST)
}

/// Verify a password against a bcrypt hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    bcrypt::verify(password, hash)
}

/// Generate a high-entropy hex secret (reset tokens, fallback session keys)
pub fn generate_secret() -> String {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// One-way hash of a reset token for at-rest storage.
///
/// The raw token only ever appears in the reset email; the store keeps this
/// digest and validation re-hashes the presented token.
pub fn hash_reset_token(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}
