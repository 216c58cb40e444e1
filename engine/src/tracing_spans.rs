//! Pre-built [`tracing::Span`] constructors for engine operations.
//!
//! Consistent span names and fields make attempts easy to correlate across
//! admission, verification and the completion claim.

use tracing::{info_span, Span};

/// Span covering one completion attempt end to end.
pub fn attempt_span(attempt: &str, quest: &str, user: &str) -> Span {
    info_span!("attempt", attempt = %attempt, quest = %quest, user = %user)
}

/// Span covering admission control for an attempt.
pub fn admission_span(quest: &str) -> Span {
    info_span!("admission", quest = %quest)
}

/// Span covering the layered verification run.
pub fn verification_span(layers: usize) -> Span {
    info_span!("verification", layers = layers)
}

/// Span covering a chapter unlock attempt.
pub fn unlock_span(chapter: &str, user: &str) -> Span {
    info_span!("unlock", chapter = %chapter, user = %user)
}
