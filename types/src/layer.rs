//! Verification layer identifiers.

use crate::FailureCode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One independent verification strategy.
///
/// Declaration order is execution priority: cheap deterministic checks first,
/// the remote AI classifier last. `Ord` follows that order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    AntiSpoofing,
    Gps,
    Time,
    QrScan,
    AiVision,
}

impl LayerKind {
    /// All layers in execution priority order.
    pub const PRIORITY: [LayerKind; 5] = [
        Self::AntiSpoofing,
        Self::Gps,
        Self::Time,
        Self::QrScan,
        Self::AiVision,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AntiSpoofing => "anti_spoofing",
            Self::Gps => "gps",
            Self::Time => "time",
            Self::QrScan => "qr_scan",
            Self::AiVision => "ai_vision",
        }
    }

    /// The failure code reported when this layer fails.
    pub fn failure_code(&self) -> FailureCode {
        match self {
            Self::AntiSpoofing => FailureCode::SpoofingDetected,
            Self::Gps => FailureCode::LocationMismatch,
            Self::Time => FailureCode::TimeWindowClosed,
            Self::QrScan => FailureCode::QrCodeInvalid,
            Self::AiVision => FailureCode::AiVerificationFailed,
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ord_follows_priority() {
        let mut shuffled = vec![
            LayerKind::AiVision,
            LayerKind::QrScan,
            LayerKind::Gps,
            LayerKind::AntiSpoofing,
            LayerKind::Time,
        ];
        shuffled.sort();
        assert_eq!(shuffled, LayerKind::PRIORITY.to_vec());
    }

    #[test]
    fn wire_names() {
        assert_eq!(
            serde_json::to_string(&LayerKind::QrScan).unwrap(),
            "\"qr_scan\""
        );
        assert_eq!(LayerKind::AiVision.failure_code(), FailureCode::AiVerificationFailed);
    }
}
