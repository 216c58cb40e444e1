use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid salt: {0}")]
    InvalidSalt(String),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("stored password hash is malformed: {0}")]
    MalformedHash(String),
}
