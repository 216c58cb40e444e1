//! SHA-256 hashing for scanned QR payloads.

use sha2::{Digest, Sha256};

/// Lower-case hex SHA-256 of the raw UTF-8 bytes of `input`.
pub fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// Whether `scanned` hashes to `stored_hash`.
///
/// The scanned payload is case-sensitive; the stored hex digest is not.
pub fn code_matches_hash(scanned: &str, stored_hash: &str) -> bool {
    sha256_hex(scanned).eq_ignore_ascii_case(stored_hash.trim())
}
