//! The remote classifier seam.

use crate::check::Detection;
use crate::VisionError;
use async_trait::async_trait;
use quest_types::{AiRequirements, ImagePayload};
use serde::{Deserialize, Serialize};

/// A backend that judges an image against structured requirements.
///
/// Implementations report what the model said; local policy is applied by
/// [`crate::VisionAdapter`], never by the classifier.
#[async_trait]
pub trait VisionClassifier: Send + Sync {
    /// Backend identifier, used in logs.
    fn id(&self) -> &str;

    async fn classify(
        &self,
        image: &ImagePayload,
        requirements: &AiRequirements,
    ) -> Result<ClassifierResponse, VisionError>;
}

/// Raw classifier verdict, as received on the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifierResponse {
    pub passed: bool,
    pub confidence: f64,
    #[serde(default)]
    pub detected_objects: Vec<Detection>,
    #[serde(default)]
    pub required_objects_found: Vec<String>,
    #[serde(default)]
    pub required_objects_missing: Vec<String>,
    #[serde(default)]
    pub has_face: bool,
    #[serde(default)]
    pub is_selfie: bool,
    #[serde(default)]
    pub is_blurry: bool,
    #[serde(default)]
    pub is_screen_photo: bool,
    #[serde(default)]
    pub is_printed_photo: bool,
    #[serde(default)]
    pub is_manipulated: bool,
    #[serde(default)]
    pub quality_score: Option<f64>,
    #[serde(default)]
    pub message: String,
}
