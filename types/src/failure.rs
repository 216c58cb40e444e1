//! Stable failure codes consumed by the surrounding system.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why an attempt failed. The wire form is `SCREAMING_SNAKE_CASE` and must not change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureCode {
    LocationMismatch,
    TimeWindowClosed,
    QrCodeInvalid,
    AiVerificationFailed,
    SpoofingDetected,
    AlreadyCompleted,
    QuestExpired,
    BudgetExhausted,
}

impl FailureCode {
    pub const ALL: [FailureCode; 8] = [
        Self::LocationMismatch,
        Self::TimeWindowClosed,
        Self::QrCodeInvalid,
        Self::AiVerificationFailed,
        Self::SpoofingDetected,
        Self::AlreadyCompleted,
        Self::QuestExpired,
        Self::BudgetExhausted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LocationMismatch => "LOCATION_MISMATCH",
            Self::TimeWindowClosed => "TIME_WINDOW_CLOSED",
            Self::QrCodeInvalid => "QR_CODE_INVALID",
            Self::AiVerificationFailed => "AI_VERIFICATION_FAILED",
            Self::SpoofingDetected => "SPOOFING_DETECTED",
            Self::AlreadyCompleted => "ALREADY_COMPLETED",
            Self::QuestExpired => "QUEST_EXPIRED",
            Self::BudgetExhausted => "BUDGET_EXHAUSTED",
        }
    }

    /// Whether the user may submit a new attempt after this failure.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::AlreadyCompleted | Self::QuestExpired | Self::SpoofingDetected
        )
    }
}

impl fmt::Display for FailureCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_matches_as_str() {
        for code in FailureCode::ALL {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
        }
    }

    #[test]
    fn terminal_codes_are_not_retryable() {
        assert!(!FailureCode::SpoofingDetected.is_retryable());
        assert!(!FailureCode::AlreadyCompleted.is_retryable());
        assert!(!FailureCode::QuestExpired.is_retryable());
        assert!(FailureCode::LocationMismatch.is_retryable());
        assert!(FailureCode::BudgetExhausted.is_retryable());
    }
}
