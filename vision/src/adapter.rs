//! The AI vision layer as seen by the orchestrator.

use crate::check::AiVisionCheck;
use crate::classifier::VisionClassifier;
use crate::http::HttpClassifier;
use crate::policy::evaluate;
use crate::{UnconfiguredPolicy, VisionConfig, VisionError};

use quest_types::{AiRequirements, ImagePayload};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default bound on one classification.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Wraps an optional classifier with a timeout, local policy and the
/// unconfigured-classifier policy.
pub struct VisionAdapter {
    classifier: Option<Arc<dyn VisionClassifier>>,
    timeout: Duration,
    unconfigured: UnconfiguredPolicy,
}

impl VisionAdapter {
    pub fn new(classifier: Arc<dyn VisionClassifier>) -> Self {
        Self {
            classifier: Some(classifier),
            timeout: DEFAULT_TIMEOUT,
            unconfigured: UnconfiguredPolicy::Refuse,
        }
    }

    /// An adapter with no classifier behind it.
    pub fn unconfigured(policy: UnconfiguredPolicy) -> Self {
        Self {
            classifier: None,
            timeout: DEFAULT_TIMEOUT,
            unconfigured: policy,
        }
    }

    /// Build from config: an HTTP classifier if an endpoint is set, otherwise
    /// an unconfigured adapter following `unconfigured_policy`.
    pub fn from_config(config: &VisionConfig) -> Result<Self, VisionError> {
        let classifier: Option<Arc<dyn VisionClassifier>> = if config.is_configured() {
            Some(Arc::new(HttpClassifier::from_config(config)?))
        } else {
            None
        };
        Ok(Self {
            classifier,
            timeout: config.timeout(),
            unconfigured: config.unconfigured_policy,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.classifier.is_some()
    }

    /// Judge `image` against `requirements`.
    ///
    /// `Ok` carries a verdict, passed or not. `Err` means the image was never
    /// judged (timeout, unreachable classifier, refused unconfigured
    /// classifier) and the caller should treat it as an infrastructure failure.
    pub async fn verify(
        &self,
        image: Option<&ImagePayload>,
        requirements: &AiRequirements,
    ) -> Result<AiVisionCheck, VisionError> {
        let Some(image) = image else {
            return Ok(AiVisionCheck::image_missing());
        };

        let Some(classifier) = &self.classifier else {
            return match self.unconfigured {
                UnconfiguredPolicy::Refuse => Err(VisionError::NotConfigured),
                UnconfiguredPolicy::StandIn => {
                    warn!(
                        required = requirements.required_objects.len(),
                        "no classifier configured, accepting image as unverified stand-in"
                    );
                    Ok(AiVisionCheck::unverified_stand_in(
                        &requirements.required_objects,
                    ))
                }
            };
        };

        let call = classifier.classify(image, requirements);
        let response = match tokio::time::timeout(self.timeout, call).await {
            Err(_) => return Err(VisionError::Timeout(self.timeout.as_millis() as u64)),
            Ok(Err(VisionError::MalformedResponse(detail))) => {
                warn!(classifier = classifier.id(), %detail, "malformed classifier response");
                return Ok(AiVisionCheck::malformed_response());
            }
            Ok(Err(e)) => return Err(e),
            Ok(Ok(response)) => response,
        };

        let check = evaluate(response, requirements);
        debug!(
            classifier = classifier.id(),
            passed = check.passed,
            confidence = check.confidence,
            overrides = check.overrides.len(),
            "classifier verdict"
        );
        Ok(check)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::Provenance;
    use crate::classifier::ClassifierResponse;
    use crate::MALFORMED_RESPONSE_MESSAGE;
    use async_trait::async_trait;

    enum Behaviour {
        Respond(ClassifierResponse),
        Malformed,
        Unreachable,
        Hang,
    }

    struct FakeClassifier(Behaviour);

    #[async_trait]
    impl VisionClassifier for FakeClassifier {
        fn id(&self) -> &str {
            "fake"
        }

        async fn classify(
            &self,
            _image: &ImagePayload,
            _requirements: &AiRequirements,
        ) -> Result<ClassifierResponse, VisionError> {
            match &self.0 {
                Behaviour::Respond(r) => Ok(r.clone()),
                Behaviour::Malformed => Err(VisionError::MalformedResponse("eof".into())),
                Behaviour::Unreachable => Err(VisionError::Unreachable("refused".into())),
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    unreachable!("timeout fires first")
                }
            }
        }
    }

    fn adapter(b: Behaviour) -> VisionAdapter {
        VisionAdapter::new(Arc::new(FakeClassifier(b)))
    }

    fn image() -> ImagePayload {
        ImagePayload::new("image/jpeg", vec![0xff, 0xd8, 0xff])
    }

    fn response(passed: bool, confidence: f64) -> ClassifierResponse {
        serde_json::from_value(serde_json::json!({
            "passed": passed,
            "confidence": confidence,
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn missing_image_fails_without_calling() {
        let check = adapter(Behaviour::Unreachable)
            .verify(None, &AiRequirements::default())
            .await
            .unwrap();
        assert!(!check.passed);
        assert_eq!(check.message, "image not provided");
    }

    #[tokio::test]
    async fn pass_is_normalized() {
        let check = adapter(Behaviour::Respond(response(true, 0.9)))
            .verify(Some(&image()), &AiRequirements::default())
            .await
            .unwrap();
        assert!(check.passed);
        assert!(check.is_verified());
    }

    #[tokio::test]
    async fn malformed_response_is_a_verification_failure() {
        let check = adapter(Behaviour::Malformed)
            .verify(Some(&image()), &AiRequirements::default())
            .await
            .unwrap();
        assert!(!check.passed);
        assert_eq!(check.message, MALFORMED_RESPONSE_MESSAGE);
    }

    #[tokio::test]
    async fn unreachable_is_an_error() {
        let err = adapter(Behaviour::Unreachable)
            .verify(Some(&image()), &AiRequirements::default())
            .await
            .unwrap_err();
        assert!(matches!(err, VisionError::Unreachable(_)));
    }

    #[tokio::test]
    async fn slow_classifier_times_out() {
        let err = adapter(Behaviour::Hang)
            .with_timeout(Duration::from_millis(50))
            .verify(Some(&image()), &AiRequirements::default())
            .await
            .unwrap_err();
        assert!(matches!(err, VisionError::Timeout(50)));
    }

    #[tokio::test]
    async fn unconfigured_refuses_by_default() {
        let adapter = VisionAdapter::from_config(&VisionConfig::default()).unwrap();
        assert!(!adapter.is_configured());
        let err = adapter
            .verify(Some(&image()), &AiRequirements::default())
            .await
            .unwrap_err();
        assert!(matches!(err, VisionError::NotConfigured));
    }

    #[tokio::test]
    async fn stand_in_passes_tagged_unverified() {
        let adapter = VisionAdapter::unconfigured(UnconfiguredPolicy::StandIn);
        let check = adapter
            .verify(Some(&image()), &AiRequirements::default())
            .await
            .unwrap();
        assert!(check.passed);
        assert_eq!(check.provenance, Provenance::UnverifiedStandIn);
        assert!(!check.is_verified());
    }
}
