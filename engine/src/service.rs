//! Completion service: admission control → verification → atomic claim.

use std::sync::Arc;

use chrono::NaiveDate;
use quest_store::{check_limits, ClaimOutcome, CompletionClaim, CompletionStore};
use quest_types::{
    AttemptId, Clock, FailureCode, LayerKind, QuestId, QuestRequirement, SubmissionEvidence,
    Timestamp, UserId,
};
use quest_verification::time_window::parse_timezone;
use quest_verification::{
    select_layers, AntiSpoofingGate, CompletionAttempt, LayerResult, VerificationOrchestrator, VerificationResult,
};
use quest_vision::{Provenance, VisionAdapter};
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::metrics::EngineMetrics;
use crate::tracing_spans::{admission_span, attempt_span, verification_span};
use crate::EngineError;

/// Runs one completion attempt through its whole lifecycle.
///
/// The service is stateless apart from its collaborators; concurrent calls
/// are safe as long as the store's `try_claim` is atomic.
pub struct CompletionService {
    orchestrator: VerificationOrchestrator,
    store: Arc<dyn CompletionStore>,
    clock: Arc<dyn Clock>,
    metrics: Option<Arc<EngineMetrics>>,
}

impl CompletionService {
    pub fn new(orchestrator: VerificationOrchestrator, store: Arc<dyn CompletionStore>) -> Self {
        let clock = Arc::clone(orchestrator.clock());
        Self {
            orchestrator,
            store,
            clock,
            metrics: None,
        }
    }

    /// Build the orchestrator from config.
    pub fn from_config(
        config: &EngineConfig,
        store: Arc<dyn CompletionStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, EngineError> {
        let vision = VisionAdapter::from_config(&config.vision)?;
        let gate = AntiSpoofingGate::new(config.anti_spoofing.clone());
        Ok(Self::new(
            VerificationOrchestrator::new(gate, vision, clock),
            store,
        ))
    }

    pub fn with_metrics(mut self, metrics: Arc<EngineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Submit evidence for `quest` on behalf of `user`.
    ///
    /// Verification failures and lost claims come back as a `failed`
    /// attempt. `Err` is reserved for store errors and internal invariant
    /// violations.
    pub async fn submit(
        &self,
        quest: &QuestId,
        requirement: &QuestRequirement,
        user: &UserId,
        evidence: &SubmissionEvidence,
    ) -> Result<CompletionAttempt, EngineError> {
        let id = AttemptId::new(Uuid::new_v4().to_string());
        let span = attempt_span(id.as_str(), quest.as_str(), user.as_str());
        self.run(id, quest, requirement, user, evidence)
            .instrument(span)
            .await
    }

    async fn run(
        &self,
        id: AttemptId,
        quest: &QuestId,
        requirement: &QuestRequirement,
        user: &UserId,
        evidence: &SubmissionEvidence,
    ) -> Result<CompletionAttempt, EngineError> {
        let now = self.clock.now();
        let mut attempt = CompletionAttempt::new(id, quest.clone(), user.clone(), now);
        if let Some(m) = &self.metrics {
            m.attempts.inc();
        }

        let day = quest_day(requirement, now);

        let admission = admission_span(quest.as_str())
            .in_scope(|| self.admit(quest, requirement, user, day, now))?;
        if let Some((code, reason)) = admission {
            info!(%code, %reason, "attempt not admitted");
            attempt.fail(code, reason, now)?;
            self.record_failure(code, false);
            return Ok(attempt);
        }

        attempt.begin_verification(self.clock.now())?;
        let result = self
            .orchestrator
            .verify(requirement, evidence)
            .instrument(verification_span(select_layers(requirement).len()))
            .await?;
        self.record_verification(&result);
        let passed = result.passed();
        let failure = result
            .failure_code()
            .map(|code| (code, result.failure_message().unwrap_or_default().to_string()));
        let infrastructure = result.infrastructure_failure();
        attempt.attach_result(result)?;

        if !passed {
            let (code, reason) = failure.unwrap_or((
                FailureCode::AiVerificationFailed,
                "verification failed".to_string(),
            ));
            attempt.fail(code, reason, self.clock.now())?;
            self.record_failure(code, infrastructure);
            return Ok(attempt);
        }

        let claim = CompletionClaim {
            quest: quest.clone(),
            user: user.clone(),
            day,
            limits: requirement.limits.clone(),
            claimed_at: self.clock.now(),
        };
        match self.store.try_claim(&claim)? {
            ClaimOutcome::Recorded(counters) => {
                attempt.complete(self.clock.now())?;
                debug!(total = counters.total_completions, "completion claimed");
                if let Some(m) = &self.metrics {
                    m.completions.inc();
                }
            }
            ClaimOutcome::Denied(denial) => {
                info!(code = %denial.code, reason = %denial.reason, "completion claim lost");
                attempt.fail(denial.code, denial.reason, self.clock.now())?;
                self.record_failure(denial.code, false);
            }
        }
        Ok(attempt)
    }

    /// Advisory pre-check. `Some` carries the denial.
    fn admit(
        &self,
        quest: &QuestId,
        requirement: &QuestRequirement,
        user: &UserId,
        day: NaiveDate,
        now: Timestamp,
    ) -> Result<Option<(FailureCode, String)>, EngineError> {
        let limits = &requirement.limits;
        if !limits.active {
            return Ok(Some((FailureCode::QuestExpired, "quest is not active".into())));
        }
        if let Some(expires_at) = limits.expires_at {
            if now >= expires_at {
                return Ok(Some((FailureCode::QuestExpired, "quest has expired".into())));
            }
        }

        let quest_counters = self.store.quest_counters(quest)?;
        let user_counters = self.store.user_counters(quest, user, day)?;
        Ok(check_limits(limits, &quest_counters, &user_counters).map(|d| (d.code, d.reason)))
    }

    fn record_verification(&self, result: &VerificationResult) {
        let Some(m) = &self.metrics else {
            return;
        };
        if let Some(ms) = result.duration_ms() {
            m.verification_latency_ms.observe(ms as f64);
        }
        if let Some(LayerResult::AiVision(check)) = result.layer(LayerKind::AiVision) {
            match check.provenance {
                Provenance::Classifier => m.ai_calls.inc(),
                Provenance::UnverifiedStandIn => m.unverified_passes.inc(),
                Provenance::NotEvaluated => {}
            }
        }
        if let Some(LayerResult::Errored(e)) = result.layer(LayerKind::AiVision) {
            if !e.configuration {
                m.ai_calls.inc();
            }
        }
    }

    fn record_failure(&self, code: FailureCode, infrastructure: bool) {
        let Some(m) = &self.metrics else {
            return;
        };
        m.failures.with_label_values(&[code.as_str()]).inc();
        if infrastructure {
            m.infrastructure_failures.inc();
        }
        if code == FailureCode::SpoofingDetected {
            m.spoofing_rejections.inc();
        }
    }
}

/// Calendar day of `now` in the quest's timezone, for daily limits.
///
/// An unknown timezone falls back to UTC here; the time layer reports the
/// configuration error itself.
pub fn quest_day(requirement: &QuestRequirement, now: Timestamp) -> NaiveDate {
    let utc = now.to_datetime();
    match parse_timezone(requirement.timezone()) {
        Ok(tz) => utc.with_timezone(&tz).date_naive(),
        Err(e) => {
            warn!(error = %e, "falling back to UTC for daily limit");
            utc.date_naive()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use quest_types::TimeWindowConfig;

    #[test]
    fn quest_day_uses_quest_timezone() {
        // 20:00 UTC on the 15th is already the 16th in Tokyo.
        let now = Timestamp::from(Utc.with_ymd_and_hms(2024, 3, 15, 20, 0, 0).unwrap());
        let tokyo = QuestRequirement {
            time_window: Some(TimeWindowConfig {
                timezone: "Asia/Tokyo".into(),
                ..TimeWindowConfig::default()
            }),
            ..QuestRequirement::default()
        };
        assert_eq!(quest_day(&tokyo, now), NaiveDate::from_ymd_opt(2024, 3, 16).unwrap());
        assert_eq!(
            quest_day(&QuestRequirement::default(), now),
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
        );
    }
}
