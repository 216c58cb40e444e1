//! Chapter unlock conditions.
//!
//! Chapters reuse the quest verifiers but are binary: no scoring, no AI.
//! Gates run in a fixed order and the first closed gate wins.

use crate::geo::GeoVerifier;
use crate::qr::QrVerifier;
use crate::time_window::TimeWindowVerifier;
use crate::VerificationError;
use quest_crypto::verify_password;
use quest_types::{
    ChapterId, GeoPoint, Timestamp, UnlockCondition, UnlockMethod, UnlockPayload, UnlockRecord,
    UserId,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Result of evaluating an [`UnlockCondition`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UnlockDecision {
    /// All gates open; `method` is the last gate evaluated.
    Open { method: UnlockMethod },
    /// `gate` is closed. `None` for the previous-chapter dependency.
    Closed {
        gate: Option<UnlockMethod>,
        message: String,
    },
}

#[derive(Clone, Copy, Debug, Default)]
pub struct UnlockConditionEvaluator {
    geo: GeoVerifier,
    time: TimeWindowVerifier,
    qr: QrVerifier,
}

impl UnlockConditionEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate previous-step, location, time, QR and password gates in order.
    ///
    /// Errors only on invalid configuration (bad timezone, unusable password hash).
    pub fn evaluate(
        &self,
        condition: &UnlockCondition,
        payload: &UnlockPayload,
        previous_unlocked: bool,
        at: Timestamp,
    ) -> Result<UnlockDecision, VerificationError> {
        if condition.requires_previous && !previous_unlocked {
            return Ok(closed(None, "Unlock the previous chapter first"));
        }

        let mut method = UnlockMethod::Open;

        if let Some(target) = &condition.location {
            let point = match (payload.latitude, payload.longitude) {
                (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon)),
                _ => None,
            };
            let check = self.geo.verify(point, target);
            if !check.passed {
                return Ok(closed(Some(UnlockMethod::Location), check.message));
            }
            method = UnlockMethod::Location;
        }

        if let Some(window) = condition.time_window.as_ref().filter(|w| w.enabled) {
            let check = self.time.verify(window, at)?;
            if !check.passed {
                return Ok(closed(Some(UnlockMethod::Time), check.message));
            }
            method = UnlockMethod::Time;
        }

        if let Some(hash) = &condition.qr_code_hash {
            let check = self.qr.verify(payload.qr_code.as_deref(), hash);
            if !check.passed {
                return Ok(closed(Some(UnlockMethod::Qr), check.message));
            }
            method = UnlockMethod::Qr;
        }

        if let Some(stored) = &condition.password_hash {
            let Some(password) = payload.password.as_deref() else {
                return Ok(closed(Some(UnlockMethod::Password), "password not provided"));
            };
            let matches = verify_password(password, stored)
                .map_err(|e| VerificationError::PasswordHash(e.to_string()))?;
            if !matches {
                return Ok(closed(Some(UnlockMethod::Password), "incorrect password"));
            }
            method = UnlockMethod::Password;
        }

        Ok(UnlockDecision::Open { method })
    }
}

fn closed(gate: Option<UnlockMethod>, message: impl Into<String>) -> UnlockDecision {
    UnlockDecision::Closed {
        gate,
        message: message.into(),
    }
}

/// Append-only list of unlock records.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnlockHistory(Vec<UnlockRecord>);

impl UnlockHistory {
    pub fn records(&self) -> &[UnlockRecord] {
        &self.0
    }

    pub fn find(&self, user: &UserId) -> Option<&UnlockRecord> {
        self.0.iter().find(|r| &r.user == user)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn append(&mut self, record: UnlockRecord) {
        self.0.push(record);
    }
}

/// What happened to one unlock attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UnlockOutcome {
    Unlocked { record: UnlockRecord },
    AlreadyUnlocked { record: UnlockRecord },
    Locked {
        gate: Option<UnlockMethod>,
        message: String,
    },
}

impl UnlockOutcome {
    pub fn is_unlocked(&self) -> bool {
        !matches!(self, Self::Locked { .. })
    }
}

/// A story chapter and its unlock history.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub id: ChapterId,
    #[serde(default)]
    pub condition: UnlockCondition,
    #[serde(default)]
    history: UnlockHistory,
}

impl Chapter {
    pub fn new(id: ChapterId, condition: UnlockCondition) -> Self {
        Self {
            id,
            condition,
            history: UnlockHistory::default(),
        }
    }

    pub fn history(&self) -> &UnlockHistory {
        &self.history
    }

    pub fn is_unlocked_by(&self, user: &UserId) -> bool {
        self.history.find(user).is_some()
    }

    /// Try to unlock for `user`. A successful unlock appends to the history;
    /// users already in the history get their existing record back.
    pub fn try_unlock(
        &mut self,
        evaluator: &UnlockConditionEvaluator,
        user: &UserId,
        payload: &UnlockPayload,
        previous_unlocked: bool,
        at: Timestamp,
    ) -> Result<UnlockOutcome, VerificationError> {
        if let Some(existing) = self.history.find(user) {
            return Ok(UnlockOutcome::AlreadyUnlocked {
                record: existing.clone(),
            });
        }

        match evaluator.evaluate(&self.condition, payload, previous_unlocked, at)? {
            UnlockDecision::Open { method } => {
                let record = UnlockRecord {
                    user: user.clone(),
                    unlocked_at: at,
                    method,
                };
                debug!(chapter = %self.id, user = %user, %method, "chapter unlocked");
                self.history.append(record.clone());
                Ok(UnlockOutcome::Unlocked { record })
            }
            UnlockDecision::Closed { gate, message } => Ok(UnlockOutcome::Locked { gate, message }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quest_crypto::{hash_password, sha256_hex};
    use quest_types::{GeoTarget, TimeWindowConfig};

    fn noon() -> Timestamp {
        // 2024-03-15T12:00:00Z
        Timestamp::from_secs(1_710_504_000)
    }

    fn gated() -> UnlockCondition {
        UnlockCondition {
            location: Some(GeoTarget {
                coordinates: GeoPoint::new(48.8584, 2.2945),
                radius_meters: 100.0,
            }),
            qr_code_hash: Some(sha256_hex("TOWER")),
            ..UnlockCondition::default()
        }
    }

    fn at_tower() -> UnlockPayload {
        UnlockPayload {
            latitude: Some(48.8584),
            longitude: Some(2.2945),
            qr_code: Some("TOWER".into()),
            password: None,
        }
    }

    #[test]
    fn open_chapter_unlocks_with_open_method() {
        let decision = UnlockConditionEvaluator::new()
            .evaluate(&UnlockCondition::default(), &UnlockPayload::default(), false, noon())
            .unwrap();
        assert_eq!(decision, UnlockDecision::Open { method: UnlockMethod::Open });
    }

    #[test]
    fn previous_step_is_checked_first() {
        let condition = UnlockCondition {
            requires_previous: true,
            ..gated()
        };
        let decision = UnlockConditionEvaluator::new()
            .evaluate(&condition, &at_tower(), false, noon())
            .unwrap();
        assert_eq!(
            decision,
            UnlockDecision::Closed {
                gate: None,
                message: "Unlock the previous chapter first".into(),
            }
        );
    }

    #[test]
    fn last_gate_names_the_method() {
        let decision = UnlockConditionEvaluator::new()
            .evaluate(&gated(), &at_tower(), false, noon())
            .unwrap();
        assert_eq!(decision, UnlockDecision::Open { method: UnlockMethod::Qr });
    }

    #[test]
    fn missing_coordinates_close_location_gate() {
        let payload = UnlockPayload {
            longitude: None,
            ..at_tower()
        };
        let decision = UnlockConditionEvaluator::new()
            .evaluate(&gated(), &payload, false, noon())
            .unwrap();
        assert!(matches!(
            decision,
            UnlockDecision::Closed { gate: Some(UnlockMethod::Location), .. }
        ));
    }

    #[test]
    fn closed_time_window() {
        let condition = UnlockCondition {
            time_window: Some(TimeWindowConfig {
                start_time: Some("18:00".into()),
                end_time: Some("23:00".into()),
                ..TimeWindowConfig::default()
            }),
            ..UnlockCondition::default()
        };
        let decision = UnlockConditionEvaluator::new()
            .evaluate(&condition, &UnlockPayload::default(), false, noon())
            .unwrap();
        assert!(matches!(
            decision,
            UnlockDecision::Closed { gate: Some(UnlockMethod::Time), .. }
        ));
    }

    #[test]
    fn password_gate() {
        let condition = UnlockCondition {
            password_hash: Some(hash_password("open sesame", b"chapter-salt-01").unwrap()),
            ..UnlockCondition::default()
        };
        let evaluator = UnlockConditionEvaluator::new();

        let missing = evaluator
            .evaluate(&condition, &UnlockPayload::default(), false, noon())
            .unwrap();
        assert_eq!(
            missing,
            UnlockDecision::Closed {
                gate: Some(UnlockMethod::Password),
                message: "password not provided".into(),
            }
        );

        let wrong = UnlockPayload {
            password: Some("open barley".into()),
            ..UnlockPayload::default()
        };
        assert!(matches!(
            evaluator.evaluate(&condition, &wrong, false, noon()).unwrap(),
            UnlockDecision::Closed { .. }
        ));

        let right = UnlockPayload {
            password: Some("open sesame".into()),
            ..UnlockPayload::default()
        };
        assert_eq!(
            evaluator.evaluate(&condition, &right, false, noon()).unwrap(),
            UnlockDecision::Open { method: UnlockMethod::Password }
        );
    }

    #[test]
    fn garbage_password_hash_is_an_error() {
        let condition = UnlockCondition {
            password_hash: Some("not-a-phc-string".into()),
            ..UnlockCondition::default()
        };
        let payload = UnlockPayload {
            password: Some("x".into()),
            ..UnlockPayload::default()
        };
        assert!(matches!(
            UnlockConditionEvaluator::new().evaluate(&condition, &payload, false, noon()),
            Err(VerificationError::PasswordHash(_))
        ));
    }

    #[test]
    fn history_is_append_only_and_deduplicated() {
        let evaluator = UnlockConditionEvaluator::new();
        let mut chapter = Chapter::new(ChapterId::new("ch-1"), gated());
        let alice = UserId::new("alice");

        let first = chapter
            .try_unlock(&evaluator, &alice, &at_tower(), false, noon())
            .unwrap();
        assert!(matches!(first, UnlockOutcome::Unlocked { .. }));

        let again = chapter
            .try_unlock(
                &evaluator,
                &alice,
                &UnlockPayload::default(),
                false,
                Timestamp::from_secs(1_710_600_000),
            )
            .unwrap();
        match again {
            UnlockOutcome::AlreadyUnlocked { record } => {
                assert_eq!(record.unlocked_at, noon());
                assert_eq!(record.method, UnlockMethod::Qr);
            }
            other => panic!("expected already unlocked, got {other:?}"),
        }

        let bob = UserId::new("bob");
        let locked = chapter
            .try_unlock(&evaluator, &bob, &UnlockPayload::default(), false, noon())
            .unwrap();
        assert!(!locked.is_unlocked());
        assert_eq!(chapter.history().len(), 1);
        assert!(chapter.is_unlocked_by(&alice));
        assert!(!chapter.is_unlocked_by(&bob));
    }
}
