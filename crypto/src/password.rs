//! Argon2id password hashing for chapter unlock passwords.
//!
//! Stored hashes are PHC strings (`$argon2id$v=19$...`), so parameters and
//! salt travel with the hash.

use crate::CryptoError;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

/// Hash `password` with the given salt bytes (4..=64 bytes).
pub fn hash_password(password: &str, salt: &[u8]) -> Result<String, CryptoError> {
    let salt = SaltString::encode_b64(salt).map_err(|e| CryptoError::InvalidSalt(e.to_string()))?;
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| CryptoError::Hashing(e.to_string()))?;
    Ok(hash.to_string())
}

/// Check `password` against a stored PHC string.
///
/// Returns `Ok(false)` on mismatch and `Err` only when the stored hash
/// itself cannot be parsed.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, CryptoError> {
    let parsed =
        PasswordHash::new(stored_hash).map_err(|e| CryptoError::MalformedHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
