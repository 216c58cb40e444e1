//! One-way hashing primitives for the quest verification engine.
//!
//! - **SHA-256** (lower-case hex) for QR payloads
//! - **Argon2id** (PHC strings) for chapter passwords

pub mod error;
pub mod hash;
pub mod password;

pub use error::CryptoError;
pub use hash::{code_matches_hash, sha256_hex};
pub use password::{hash_password, verify_password};
