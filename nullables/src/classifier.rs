//! Nullable image classifier.

use async_trait::async_trait;
use quest_types::{AiRequirements, ImagePayload};
use quest_vision::{ClassifierResponse, VisionClassifier, VisionError};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// What the classifier does when called.
#[derive(Clone, Debug)]
pub enum NullVerdict {
    Respond(ClassifierResponse),
    Malformed,
    Unreachable,
}

/// Classifier with a scripted verdict, optional delay and a call counter.
pub struct NullClassifier {
    verdict: Mutex<NullVerdict>,
    delay: Option<Duration>,
    call_count: AtomicU32,
}

impl NullClassifier {
    pub fn new(verdict: NullVerdict) -> Self {
        Self {
            verdict: Mutex::new(verdict),
            delay: None,
            call_count: AtomicU32::new(0),
        }
    }

    /// Passes with the given confidence and confirms every required object.
    pub fn passing(confidence: f64) -> Self {
        Self::new(NullVerdict::Respond(response(true, confidence)))
    }

    pub fn failing(message: &str) -> Self {
        let mut resp = response(false, 0.2);
        resp.message = message.to_string();
        Self::new(NullVerdict::Respond(resp))
    }

    pub fn unreachable() -> Self {
        Self::new(NullVerdict::Unreachable)
    }

    pub fn malformed() -> Self {
        Self::new(NullVerdict::Malformed)
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_verdict(&self, verdict: NullVerdict) {
        *self.verdict.lock().unwrap() = verdict;
    }

    /// Get the number of times classify was called.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }
}

fn response(passed: bool, confidence: f64) -> ClassifierResponse {
    ClassifierResponse {
        passed,
        confidence,
        detected_objects: Vec::new(),
        required_objects_found: Vec::new(),
        required_objects_missing: Vec::new(),
        has_face: false,
        is_selfie: false,
        is_blurry: false,
        is_screen_photo: false,
        is_printed_photo: false,
        is_manipulated: false,
        quality_score: None,
        message: String::new(),
    }
}

#[async_trait]
impl VisionClassifier for NullClassifier {
    fn id(&self) -> &str {
        "null"
    }

    async fn classify(
        &self,
        _image: &ImagePayload,
        requirements: &AiRequirements,
    ) -> Result<ClassifierResponse, VisionError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let verdict = self.verdict.lock().unwrap().clone();
        match verdict {
            NullVerdict::Respond(mut resp) => {
                if resp.passed && resp.required_objects_found.is_empty() {
                    resp.required_objects_found = requirements.required_objects.clone();
                }
                Ok(resp)
            }
            NullVerdict::Malformed => Err(VisionError::MalformedResponse(
                "EOF while parsing an object".into(),
            )),
            NullVerdict::Unreachable => {
                Err(VisionError::Unreachable("null classifier is unreachable".into()))
            }
        }
    }
}
