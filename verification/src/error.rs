use quest_types::LayerKind;
use quest_vision::VisionError;
use thiserror::Error;

use crate::state::AttemptStateKind;

#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("invalid attempt transition from {from} to {to}")]
    InvalidTransition {
        from: AttemptStateKind,
        to: AttemptStateKind,
    },

    #[error("verification result is already final; cannot record {0} layer")]
    ResultFinalized(LayerKind),

    #[error("verification result is already final")]
    AlreadyFinal,

    #[error("layer {0} was already recorded")]
    DuplicateLayer(LayerKind),

    #[error("attempt already has a verification result")]
    ResultAlreadyAttached,

    #[error("verification result is still pending")]
    ResultNotFinal,

    #[error("attempt cannot complete without a passed verification result")]
    ResultNotPassed,

    #[error("unknown timezone: {0}")]
    UnknownTimezone(String),

    #[error("invalid time of day {0:?}, expected HH:MM")]
    InvalidTimeOfDay(String),

    #[error("invalid day of week {0}, expected 0 (Sunday) to 6 (Saturday)")]
    InvalidDayOfWeek(u8),

    #[error("chapter password hash is unusable: {0}")]
    PasswordHash(String),

    #[error("AI verification: {0}")]
    Vision(#[from] VisionError),
}

impl VerificationError {
    /// Whether this error comes from configuration rather than the submission.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnknownTimezone(_)
                | Self::InvalidTimeOfDay(_)
                | Self::InvalidDayOfWeek(_)
                | Self::PasswordHash(_)
                | Self::Vision(VisionError::NotConfigured)
                | Self::Vision(VisionError::Config(_))
        )
    }
}
