use thiserror::Error;

/// Errors from the classifier integration.
///
/// Everything except [`VisionError::MalformedResponse`] is an infrastructure
/// failure: the image was never judged, so the user may retry.
#[derive(Debug, Error)]
pub enum VisionError {
    #[error("classifier timed out after {0}ms")]
    Timeout(u64),

    #[error("classifier unreachable: {0}")]
    Unreachable(String),

    #[error("classifier request failed: {0}")]
    RequestFailed(String),

    #[error("malformed classifier response: {0}")]
    MalformedResponse(String),

    #[error("AI verification is not configured")]
    NotConfigured,

    #[error("invalid vision configuration: {0}")]
    Config(String),
}
