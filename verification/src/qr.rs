//! QR gate: the scanned payload must hash to the quest's stored SHA-256.

use quest_crypto::code_matches_hash;
use serde::{Deserialize, Serialize};

/// Outcome of the QR layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCheck {
    pub passed: bool,
    pub scanned: bool,
    pub message: String,
}

/// Compares the SHA-256 of a scanned code against the stored hash.
#[derive(Clone, Copy, Debug, Default)]
pub struct QrVerifier;

impl QrVerifier {
    pub fn verify(&self, scanned: Option<&str>, stored_hash: &str) -> QrCheck {
        let Some(code) = scanned else {
            return QrCheck {
                passed: false,
                scanned: false,
                message: "QR code not scanned".to_string(),
            };
        };

        let passed = code_matches_hash(code, stored_hash);
        QrCheck {
            passed,
            scanned: true,
            message: if passed {
                "QR code verified".to_string()
            } else {
                "QR code does not match this quest".to_string()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quest_crypto::sha256_hex;

    #[test]
    fn scanned_code_is_case_sensitive() {
        let stored = sha256_hex("ABC123");
        assert!(QrVerifier.verify(Some("ABC123"), &stored).passed);
        assert!(!QrVerifier.verify(Some("abc123"), &stored).passed);
    }

    #[test]
    fn stored_hash_case_is_ignored() {
        let stored = sha256_hex("ABC123").to_uppercase();
        assert!(QrVerifier.verify(Some("ABC123"), &stored).passed);
    }

    #[test]
    fn absent_code() {
        let check = QrVerifier.verify(None, &sha256_hex("x"));
        assert!(!check.passed);
        assert!(!check.scanned);
        assert_eq!(check.message, "QR code not scanned");
    }
}
