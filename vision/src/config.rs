use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What to do when an AI layer is selected but no classifier is configured.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnconfiguredPolicy {
    /// Fail the layer as an infrastructure failure.
    #[default]
    Refuse,
    /// Pass the layer, tagged as an unverified stand-in.
    StandIn,
}

/// Classifier connection settings (`[vision]` in the engine config).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisionConfig {
    /// Base URL of the classifier; `None` means no classifier is configured.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Upper bound on one classification, including the response body.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default)]
    pub unconfigured_policy: UnconfiguredPolicy,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    5
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            unconfigured_policy: UnconfiguredPolicy::default(),
        }
    }
}

impl VisionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Whether an endpoint is set to something non-blank.
    pub fn is_configured(&self) -> bool {
        self.endpoint
            .as_deref()
            .map(|e| !e.trim().is_empty())
            .unwrap_or(false)
    }
}
