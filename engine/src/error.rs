use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("store error: {0}")]
    Store(#[from] quest_store::StoreError),

    #[error("verification error: {0}")]
    Verification(#[from] quest_verification::VerificationError),

    #[error("vision error: {0}")]
    Vision(#[from] quest_vision::VisionError),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("logging already initialised: {0}")]
    Logging(String),

    #[error("unknown chapter {0}")]
    UnknownChapter(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
