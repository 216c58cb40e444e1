//! Story chapters: ordered unlocks with a previous-chapter dependency.

use std::sync::Arc;

use quest_types::{ChapterId, Clock, UnlockPayload, UserId};
use quest_verification::{Chapter, UnlockConditionEvaluator, UnlockOutcome};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::metrics::EngineMetrics;
use crate::tracing_spans::unlock_span;
use crate::EngineError;

/// An ordered list of chapters. Chapter `n` depends on chapter `n - 1`
/// when its condition requires the previous step.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub title: String,
    pub chapters: Vec<Chapter>,
}

impl Story {
    fn position(&self, chapter: &ChapterId) -> Result<usize, EngineError> {
        self.chapters
            .iter()
            .position(|c| &c.id == chapter)
            .ok_or_else(|| EngineError::UnknownChapter(chapter.to_string()))
    }
}

pub struct StoryService {
    evaluator: UnlockConditionEvaluator,
    clock: Arc<dyn Clock>,
    metrics: Option<Arc<EngineMetrics>>,
}

impl StoryService {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            evaluator: UnlockConditionEvaluator::new(),
            clock,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<EngineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Unlock a standalone chapter; the caller says whether the previous
    /// step is unlocked.
    pub fn unlock(
        &self,
        chapter: &mut Chapter,
        user: &UserId,
        payload: &UnlockPayload,
        previous_unlocked: bool,
    ) -> Result<UnlockOutcome, EngineError> {
        let _span = unlock_span(chapter.id.as_str(), user.as_str()).entered();
        let outcome = chapter.try_unlock(
            &self.evaluator,
            user,
            payload,
            previous_unlocked,
            self.clock.now(),
        )?;

        let label = match &outcome {
            UnlockOutcome::Unlocked { record } => {
                info!(method = %record.method, "chapter unlocked");
                "unlocked"
            }
            UnlockOutcome::AlreadyUnlocked { .. } => "already_unlocked",
            UnlockOutcome::Locked { message, .. } => {
                info!(%message, "chapter still locked");
                "locked"
            }
        };
        if let Some(m) = &self.metrics {
            m.unlocks.with_label_values(&[label]).inc();
        }
        Ok(outcome)
    }

    /// Unlock a chapter of `story`, deriving the previous-step dependency
    /// from the preceding chapter's history.
    pub fn unlock_in_story(
        &self,
        story: &mut Story,
        chapter: &ChapterId,
        user: &UserId,
        payload: &UnlockPayload,
    ) -> Result<UnlockOutcome, EngineError> {
        let index = story.position(chapter)?;
        let previous_unlocked = match index {
            0 => true,
            i => story.chapters[i - 1].is_unlocked_by(user),
        };
        self.unlock(&mut story.chapters[index], user, payload, previous_unlocked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quest_crypto::sha256_hex;
    use quest_nullables::NullClock;
    use quest_types::{Timestamp, UnlockCondition, UnlockMethod};

    fn story() -> Story {
        Story {
            title: "The Lost Map".into(),
            chapters: vec![
                Chapter::new(ChapterId::new("one"), UnlockCondition::default()),
                Chapter::new(
                    ChapterId::new("two"),
                    UnlockCondition {
                        qr_code_hash: Some(sha256_hex("MAP-2")),
                        requires_previous: true,
                        ..UnlockCondition::default()
                    },
                ),
            ],
        }
    }

    fn qr(code: &str) -> UnlockPayload {
        UnlockPayload {
            qr_code: Some(code.into()),
            ..UnlockPayload::default()
        }
    }

    #[test]
    fn chapters_unlock_in_order() {
        let service = StoryService::new(Arc::new(NullClock::new(Timestamp::from_secs(1_000))));
        let mut story = story();
        let user = UserId::new("ada");
        let two = ChapterId::new("two");

        let early = service
            .unlock_in_story(&mut story, &two, &user, &qr("MAP-2"))
            .unwrap();
        assert_eq!(
            early,
            UnlockOutcome::Locked {
                gate: None,
                message: "Unlock the previous chapter first".into(),
            }
        );

        let first = service
            .unlock_in_story(&mut story, &ChapterId::new("one"), &user, &UnlockPayload::default())
            .unwrap();
        match first {
            UnlockOutcome::Unlocked { record } => assert_eq!(record.method, UnlockMethod::Open),
            other => panic!("expected unlock, got {other:?}"),
        }

        let second = service
            .unlock_in_story(&mut story, &two, &user, &qr("MAP-2"))
            .unwrap();
        assert!(second.is_unlocked());
        assert_eq!(story.chapters[1].history().len(), 1);
    }

    #[test]
    fn unknown_chapter_is_an_error() {
        let service = StoryService::new(Arc::new(NullClock::default()));
        let err = service
            .unlock_in_story(
                &mut story(),
                &ChapterId::new("nine"),
                &UserId::new("ada"),
                &UnlockPayload::default(),
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownChapter(_)));
    }

    #[test]
    fn unlock_metrics_are_labelled() {
        let metrics = Arc::new(EngineMetrics::new().unwrap());
        let service =
            StoryService::new(Arc::new(NullClock::default())).with_metrics(Arc::clone(&metrics));
        let mut chapter = Chapter::new(ChapterId::new("solo"), UnlockCondition::default());
        let user = UserId::new("ada");
        service.unlock(&mut chapter, &user, &UnlockPayload::default(), false).unwrap();
        service.unlock(&mut chapter, &user, &UnlockPayload::default(), false).unwrap();
        assert_eq!(metrics.unlocks.with_label_values(&["unlocked"]).get(), 1);
        assert_eq!(metrics.unlocks.with_label_values(&["already_unlocked"]).get(), 1);
    }
}
