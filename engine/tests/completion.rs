//! End-to-end completion attempts against nullable collaborators.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use quest_crypto::sha256_hex;
use quest_engine::{CompletionService, EngineConfig, EngineMetrics};
use quest_nullables::{NullClassifier, NullClock, NullCompletionStore};
use quest_store::CompletionStore;
use quest_types::{
    AiRequirements, CompletionLimits, Coordinates, DeviceTelemetry, FailureCode, GeoPoint,
    GeoTarget, ImagePayload, QuestId, QuestRequirement, SubmissionEvidence, Timestamp, UserId,
};
use quest_verification::{
    AntiSpoofingGate, AttemptState, AttemptStateKind, VerificationOrchestrator,
};
use quest_vision::{VisionAdapter, VisionClassifier};

const NOW: (i32, u32, u32, u32) = (2024, 3, 15, 12);

struct Fixture {
    service: Arc<CompletionService>,
    classifier: Arc<NullClassifier>,
    store: Arc<NullCompletionStore>,
    clock: Arc<NullClock>,
    metrics: Arc<EngineMetrics>,
}

fn fixture() -> Fixture {
    let (y, m, d, h) = NOW;
    let clock = Arc::new(NullClock::at(Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()));
    let classifier = Arc::new(NullClassifier::passing(0.9));
    let store = Arc::new(NullCompletionStore::new());
    let metrics = Arc::new(EngineMetrics::new().unwrap());
    let orchestrator = VerificationOrchestrator::new(
        AntiSpoofingGate::default(),
        VisionAdapter::new(classifier.clone() as Arc<dyn VisionClassifier>),
        clock.clone(),
    );
    let service = CompletionService::new(orchestrator, store.clone() as Arc<dyn CompletionStore>)
        .with_metrics(Arc::clone(&metrics));
    Fixture {
        service: Arc::new(service),
        classifier,
        store,
        clock,
        metrics,
    }
}

fn quest(limits: CompletionLimits) -> QuestRequirement {
    QuestRequirement {
        location: Some(GeoTarget {
            coordinates: GeoPoint::new(40.7580, -73.9855),
            radius_meters: 75.0,
        }),
        qr_code_hash: Some(sha256_hex("TIMES-SQ")),
        ai: Some(AiRequirements {
            required_objects: vec!["billboard".into()],
            ..AiRequirements::default()
        }),
        limits,
        ..QuestRequirement::default()
    }
}

fn evidence() -> SubmissionEvidence {
    SubmissionEvidence {
        coordinates: Some(Coordinates::at(40.7581, -73.9854)),
        captured_at: None,
        scanned_code: Some("TIMES-SQ".into()),
        image: Some(ImagePayload::new("image/jpeg", vec![0xff, 0xd8])),
        device: Some(DeviceTelemetry::default()),
    }
}

#[tokio::test]
async fn passing_attempt_completes_and_claims() {
    let f = fixture();
    let attempt = f
        .service
        .submit(
            &QuestId::new("q1"),
            &quest(CompletionLimits::default()),
            &UserId::new("u1"),
            &evidence(),
        )
        .await
        .unwrap();

    assert_eq!(attempt.state(), &AttemptState::Completed);
    let result = attempt.result().expect("result attached");
    assert!(result.passed());
    assert_eq!(result.score(), 1.0);
    assert_eq!(f.store.claim_calls(), 1);
    assert_eq!(f.metrics.completions.get(), 1);
    assert_eq!(f.metrics.ai_calls.get(), 1);
}

#[tokio::test]
async fn second_completion_by_same_user_is_refused_at_admission() {
    let f = fixture();
    let q = quest(CompletionLimits::default());
    let user = UserId::new("u1");
    f.service
        .submit(&QuestId::new("q1"), &q, &user, &evidence())
        .await
        .unwrap();

    let again = f
        .service
        .submit(&QuestId::new("q1"), &q, &user, &evidence())
        .await
        .unwrap();
    assert_eq!(again.failure_code(), Some(FailureCode::AlreadyCompleted));
    assert!(!again.can_retry());
    assert!(again.result().is_none());
    assert_eq!(f.classifier.call_count(), 1);
}

#[tokio::test]
async fn expired_quest_is_not_verified() {
    let f = fixture();
    let limits = CompletionLimits {
        expires_at: Some(Timestamp::from_secs(1_000)),
        ..CompletionLimits::default()
    };
    let attempt = f
        .service
        .submit(&QuestId::new("q1"), &quest(limits), &UserId::new("u1"), &evidence())
        .await
        .unwrap();
    assert_eq!(attempt.failure_code(), Some(FailureCode::QuestExpired));
    assert_eq!(f.classifier.call_count(), 0);
    assert_eq!(f.store.claim_calls(), 0);
}

#[tokio::test]
async fn spoofed_device_never_reaches_classifier() {
    let f = fixture();
    let spoofed = SubmissionEvidence {
        device: Some(DeviceTelemetry {
            platform: Some("android".into()),
            is_emulator: true,
            is_mock_location: false,
            prior_flags: 2,
        }),
        ..evidence()
    };
    let attempt = f
        .service
        .submit(&QuestId::new("q1"), &quest(CompletionLimits::default()), &UserId::new("u1"), &spoofed)
        .await
        .unwrap();
    assert_eq!(attempt.failure_code(), Some(FailureCode::SpoofingDetected));
    assert!(!attempt.can_retry());
    assert_eq!(f.classifier.call_count(), 0);
    assert_eq!(f.metrics.spoofing_rejections.get(), 1);
}

#[tokio::test]
async fn location_mismatch_can_retry() {
    let f = fixture();
    let far = SubmissionEvidence {
        coordinates: Some(Coordinates::at(40.7680, -73.9855)),
        ..evidence()
    };
    let attempt = f
        .service
        .submit(&QuestId::new("q1"), &quest(CompletionLimits::default()), &UserId::new("u1"), &far)
        .await
        .unwrap();
    assert_eq!(attempt.failure_code(), Some(FailureCode::LocationMismatch));
    assert!(attempt.can_retry());
    assert_eq!(attempt.state().kind(), AttemptStateKind::Failed);
}

#[tokio::test]
async fn unreachable_classifier_is_retryable_infrastructure_failure() {
    let f = fixture();
    f.classifier.set_verdict(quest_nullables::classifier::NullVerdict::Unreachable);
    let attempt = f
        .service
        .submit(&QuestId::new("q1"), &quest(CompletionLimits::default()), &UserId::new("u1"), &evidence())
        .await
        .unwrap();
    assert_eq!(attempt.failure_code(), Some(FailureCode::AiVerificationFailed));
    assert!(attempt.can_retry());
    assert!(attempt.result().unwrap().infrastructure_failure());
    assert_eq!(f.metrics.infrastructure_failures.get(), 1);
}

#[tokio::test]
async fn daily_limit_resets_on_next_day() {
    let f = fixture();
    let limits = CompletionLimits {
        max_per_user: 5,
        daily_limit_per_user: Some(1),
        ..CompletionLimits::default()
    };
    let q = quest(limits);
    let quest_id = QuestId::new("q1");
    let user = UserId::new("u1");
    let ev = evidence();
    let submit = || f.service.submit(&quest_id, &q, &user, &ev);

    assert_eq!(submit().await.unwrap().state(), &AttemptState::Completed);
    assert_eq!(
        submit().await.unwrap().failure_code(),
        Some(FailureCode::AlreadyCompleted)
    );

    f.clock.advance_ms(24 * 60 * 60 * 1000);
    assert_eq!(submit().await.unwrap().state(), &AttemptState::Completed);
}

#[tokio::test]
async fn store_outage_is_an_error() {
    let f = fixture();
    f.store.set_offline(true);
    let result = f
        .service
        .submit(&QuestId::new("q1"), &quest(CompletionLimits::default()), &UserId::new("u1"), &evidence())
        .await;
    assert!(result.is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_attempts_respect_max_completions() {
    let f = fixture();
    let q = Arc::new(quest(CompletionLimits {
        max_completions: Some(1),
        ..CompletionLimits::default()
    }));

    let handles: Vec<_> = (0..3)
        .map(|i| {
            let service = Arc::clone(&f.service);
            let q = Arc::clone(&q);
            tokio::spawn(async move {
                service
                    .submit(&QuestId::new("q1"), &q, &UserId::new(format!("u{i}")), &evidence())
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut completed = 0;
    let mut exhausted = 0;
    for h in handles {
        let attempt = h.await.unwrap();
        match attempt.state() {
            AttemptState::Completed => completed += 1,
            AttemptState::Failed { code, .. } => {
                assert_eq!(*code, FailureCode::BudgetExhausted);
                exhausted += 1;
            }
            other => panic!("unexpected state {other:?}"),
        }
    }
    assert_eq!(completed, 1);
    assert_eq!(exhausted, 2);
    assert_eq!(
        f.store.quest_counters(&QuestId::new("q1")).unwrap().total_completions,
        1
    );
}

#[test]
fn service_builds_from_default_config() {
    let store = Arc::new(NullCompletionStore::new());
    let service = CompletionService::from_config(
        &EngineConfig::default(),
        store,
        Arc::new(NullClock::default()),
    );
    assert!(service.is_ok());
}
