//! Local policy applied on top of the classifier's verdict.
//!
//! The remote `passed` flag is only an input: any rule below forces a
//! failure, and each forced failure is recorded so the message can name it.

use crate::check::{AiVisionCheck, ImageFlags, Provenance};
use crate::classifier::ClassifierResponse;
use quest_types::AiRequirements;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A rule that turned (or kept) the verdict to failed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum PolicyOverride {
    LowConfidence { confidence: f64, minimum: f64 },
    ScreenPhoto,
    PrintedPhoto,
    Manipulated,
    MissingObjects { objects: Vec<String> },
    FaceRequired,
    SelfieRequired,
    Blurry,
}

impl fmt::Display for PolicyOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LowConfidence { confidence, minimum } => {
                write!(f, "confidence {confidence:.2} below minimum {minimum:.2}")
            }
            Self::ScreenPhoto => write!(f, "photo of a screen detected"),
            Self::PrintedPhoto => write!(f, "photo of a printed photo detected"),
            Self::Manipulated => write!(f, "image appears manipulated"),
            Self::MissingObjects { objects } => {
                write!(f, "missing required objects: {}", objects.join(", "))
            }
            Self::FaceRequired => write!(f, "a face is required"),
            Self::SelfieRequired => write!(f, "a selfie is required"),
            Self::Blurry => write!(f, "image is too blurry"),
        }
    }
}

/// Outcome of local policy.
#[derive(Clone, Debug, PartialEq)]
pub struct PolicyVerdict {
    pub passed: bool,
    pub overrides: Vec<PolicyOverride>,
    /// Required objects not confirmed, reported or inferred.
    pub missing_objects: Vec<String>,
}

/// Apply local rules to a classifier response.
pub fn apply_local_policy(
    response: &ClassifierResponse,
    requirements: &AiRequirements,
) -> PolicyVerdict {
    let mut overrides = Vec::new();

    if response.confidence < requirements.minimum_confidence {
        overrides.push(PolicyOverride::LowConfidence {
            confidence: response.confidence,
            minimum: requirements.minimum_confidence,
        });
    }
    if response.is_screen_photo {
        overrides.push(PolicyOverride::ScreenPhoto);
    }
    if response.is_printed_photo {
        overrides.push(PolicyOverride::PrintedPhoto);
    }
    if response.is_manipulated {
        overrides.push(PolicyOverride::Manipulated);
    }

    let missing_objects = missing_objects(response, requirements);
    if !missing_objects.is_empty() {
        overrides.push(PolicyOverride::MissingObjects {
            objects: missing_objects.clone(),
        });
    }

    if requirements.require_face && !response.has_face {
        overrides.push(PolicyOverride::FaceRequired);
    }
    if requirements.require_selfie && !response.is_selfie {
        overrides.push(PolicyOverride::SelfieRequired);
    }
    if requirements.reject_blurry && response.is_blurry {
        overrides.push(PolicyOverride::Blurry);
    }

    PolicyVerdict {
        passed: response.passed && overrides.is_empty(),
        overrides,
        missing_objects,
    }
}

/// Required objects the classifier reported missing, plus any it neither
/// confirmed nor detected. Matching is case-insensitive.
fn missing_objects(response: &ClassifierResponse, requirements: &AiRequirements) -> Vec<String> {
    let confirmed = |object: &str| {
        response
            .required_objects_found
            .iter()
            .any(|f| f.eq_ignore_ascii_case(object))
            || response
                .detected_objects
                .iter()
                .any(|d| d.object.eq_ignore_ascii_case(object))
    };

    let mut missing: Vec<String> = Vec::new();
    let mut push = |object: &str| {
        if !missing.iter().any(|m| m.eq_ignore_ascii_case(object)) {
            missing.push(object.to_string());
        }
    };

    for object in &response.required_objects_missing {
        push(object);
    }
    for object in &requirements.required_objects {
        if !confirmed(object) {
            push(object);
        }
    }
    missing
}

/// Build the normalized check from a classifier response.
pub(crate) fn evaluate(response: ClassifierResponse, requirements: &AiRequirements) -> AiVisionCheck {
    let verdict = apply_local_policy(&response, requirements);

    let message = if verdict.overrides.is_empty() {
        response.message.clone()
    } else {
        let reasons: Vec<String> = verdict.overrides.iter().map(|o| o.to_string()).collect();
        let prefix = if response.passed {
            "classifier passed but local policy failed the image"
        } else {
            "AI verification failed"
        };
        if response.message.is_empty() {
            format!("{prefix}: {}", reasons.join("; "))
        } else {
            format!("{prefix}: {} ({})", reasons.join("; "), response.message)
        }
    };

    let required_objects_found = requirements
        .required_objects
        .iter()
        .filter(|o| !verdict.missing_objects.iter().any(|m| m.eq_ignore_ascii_case(o)))
        .cloned()
        .collect();

    AiVisionCheck {
        passed: verdict.passed,
        confidence: response.confidence.clamp(0.0, 1.0),
        detected_objects: response.detected_objects,
        required_objects_found,
        required_objects_missing: verdict.missing_objects,
        flags: ImageFlags {
            has_face: response.has_face,
            is_selfie: response.is_selfie,
            is_blurry: response.is_blurry,
            is_screen_photo: response.is_screen_photo,
            is_printed_photo: response.is_printed_photo,
            is_manipulated: response.is_manipulated,
        },
        quality_score: response.quality_score,
        provenance: Provenance::Classifier,
        overrides: verdict.overrides,
        message,
    }
}
