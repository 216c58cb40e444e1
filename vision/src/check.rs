//! Normalized AI vision outcome.

use crate::policy::PolicyOverride;
use crate::MALFORMED_RESPONSE_MESSAGE;
use serde::{Deserialize, Serialize};

/// Where an AI verdict came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// A real classifier judged the image.
    Classifier,
    /// No classifier is configured; this is a deterministic stand-in, not a check.
    UnverifiedStandIn,
    /// The image was never sent (for example, none was submitted).
    NotEvaluated,
}

/// One detected object and the model's confidence in it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub object: String,
    pub confidence: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageFlags {
    pub has_face: bool,
    pub is_selfie: bool,
    pub is_blurry: bool,
    pub is_screen_photo: bool,
    pub is_printed_photo: bool,
    pub is_manipulated: bool,
}

/// Result of the AI vision layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiVisionCheck {
    pub passed: bool,
    pub confidence: f64,
    pub detected_objects: Vec<Detection>,
    pub required_objects_found: Vec<String>,
    pub required_objects_missing: Vec<String>,
    pub flags: ImageFlags,
    pub quality_score: Option<f64>,
    pub provenance: Provenance,
    /// Local policy rules that forced a failure.
    pub overrides: Vec<PolicyOverride>,
    pub message: String,
}

impl AiVisionCheck {
    fn empty(passed: bool, provenance: Provenance, message: String) -> Self {
        Self {
            passed,
            confidence: 0.0,
            detected_objects: Vec::new(),
            required_objects_found: Vec::new(),
            required_objects_missing: Vec::new(),
            flags: ImageFlags::default(),
            quality_score: None,
            provenance,
            overrides: Vec::new(),
            message,
        }
    }

    pub fn image_missing() -> Self {
        Self::empty(false, Provenance::NotEvaluated, "image not provided".to_string())
    }

    pub fn malformed_response() -> Self {
        Self::empty(
            false,
            Provenance::Classifier,
            MALFORMED_RESPONSE_MESSAGE.to_string(),
        )
    }

    /// A pass that was not produced by any classifier.
    pub fn unverified_stand_in(required_objects: &[String]) -> Self {
        let mut check = Self::empty(
            true,
            Provenance::UnverifiedStandIn,
            "AI verification not configured: image accepted WITHOUT a real check".to_string(),
        );
        check.confidence = 1.0;
        check.required_objects_found = required_objects.to_vec();
        check
    }

    /// Whether this verdict came from a real classifier.
    pub fn is_verified(&self) -> bool {
        self.provenance == Provenance::Classifier
    }
}
