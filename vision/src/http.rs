//! HTTP client for a remote image classifier.

use crate::classifier::{ClassifierResponse, VisionClassifier};
use crate::{VisionConfig, VisionError};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use quest_types::{AiRequirements, ImagePayload};
use serde::Serialize;
use std::time::Duration;

/// Request body for `POST {endpoint}/classify`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClassifyRequest<'a> {
    image: String,
    content_type: &'a str,
    prompt: &'a str,
    required_objects: &'a [String],
    require_face: bool,
    require_selfie: bool,
    reject_blurry: bool,
    minimum_confidence: f64,
}

/// Classifier reached over HTTP.
///
/// Sends `POST {endpoint}/classify` with a bearer token and parses the
/// camelCase JSON verdict.
pub struct HttpClassifier {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpClassifier {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self, VisionError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| VisionError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http_client,
            endpoint: endpoint.into(),
            api_key,
        })
    }

    /// Build from config. Fails if no endpoint is set.
    pub fn from_config(config: &VisionConfig) -> Result<Self, VisionError> {
        let endpoint = config
            .endpoint
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .ok_or(VisionError::NotConfigured)?;
        Self::new(
            endpoint,
            config.api_key.clone(),
            config.timeout(),
            config.connect_timeout(),
        )
    }

    fn classify_url(&self) -> String {
        format!("{}/classify", self.endpoint.trim_end_matches('/'))
    }
}

#[async_trait]
impl VisionClassifier for HttpClassifier {
    fn id(&self) -> &str {
        &self.endpoint
    }

    async fn classify(
        &self,
        image: &ImagePayload,
        requirements: &AiRequirements,
    ) -> Result<ClassifierResponse, VisionError> {
        let body = ClassifyRequest {
            image: STANDARD.encode(&image.data),
            content_type: &image.content_type,
            prompt: &requirements.prompt,
            required_objects: &requirements.required_objects,
            require_face: requirements.require_face,
            require_selfie: requirements.require_selfie,
            reject_blurry: requirements.reject_blurry,
            minimum_confidence: requirements.minimum_confidence,
        };

        let mut request = self.http_client.post(self.classify_url()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(map_send_error)?;

        if !response.status().is_success() {
            return Err(VisionError::RequestFailed(format!(
                "HTTP status {}",
                response.status()
            )));
        }

        let bytes = response.bytes().await.map_err(map_send_error)?;
        serde_json::from_slice(&bytes).map_err(|e| VisionError::MalformedResponse(e.to_string()))
    }
}

fn map_send_error(e: reqwest::Error) -> VisionError {
    if e.is_timeout() {
        VisionError::Unreachable(format!("request timed out: {e}"))
    } else if e.is_connect() {
        VisionError::Unreachable(format!("connection failed: {e}"))
    } else {
        VisionError::RequestFailed(e.to_string())
    }
}
