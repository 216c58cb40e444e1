//! Creator-configured quest requirements.
//!
//! A [`QuestRequirement`] is immutable once published. Every gate is optional;
//! which ones actually run is decided by the layer selector.

use crate::{GeoTarget, LayerKind, Timestamp};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Everything a submission must satisfy to complete a quest.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestRequirement {
    #[serde(default)]
    pub location: Option<GeoTarget>,

    #[serde(default)]
    pub time_window: Option<TimeWindowConfig>,

    /// SHA-256 (lower-case hex) of the expected QR payload.
    #[serde(default)]
    pub qr_code_hash: Option<String>,

    #[serde(default)]
    pub ai: Option<AiRequirements>,

    /// Explicit layer list. Empty means auto-detect.
    #[serde(default)]
    pub layers: Vec<LayerKind>,

    #[serde(default)]
    pub limits: CompletionLimits,
}

impl QuestRequirement {
    /// Timezone used for day boundaries (time window and daily limits).
    pub fn timezone(&self) -> &str {
        self.time_window
            .as_ref()
            .map(|w| w.timezone.as_str())
            .unwrap_or("UTC")
    }
}

/// Temporal gate. Times of day are zero-padded `"HH:MM"` strings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindowConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// IANA timezone name, e.g. `"Asia/Kolkata"`.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    #[serde(default)]
    pub start_time: Option<String>,

    #[serde(default)]
    pub end_time: Option<String>,

    /// Allowed weekdays, `0` = Sunday … `6` = Saturday. Absent or empty
    /// means every day.
    #[serde(default)]
    pub days_of_week: Option<Vec<u8>>,

    /// Date-specific windows that take precedence over everything else.
    #[serde(default)]
    pub date_overrides: Vec<DateWindow>,
}

impl Default for TimeWindowConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timezone: default_timezone(),
            start_time: None,
            end_time: None,
            days_of_week: None,
            date_overrides: Vec::new(),
        }
    }
}

/// A window that applies on one calendar date (in the configured timezone).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateWindow {
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
}

/// What the image classifier must confirm.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiRequirements {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub prompt: String,

    #[serde(default)]
    pub required_objects: Vec<String>,

    #[serde(default = "default_min_confidence")]
    pub minimum_confidence: f64,

    #[serde(default)]
    pub require_face: bool,

    #[serde(default)]
    pub require_selfie: bool,

    #[serde(default = "default_true")]
    pub reject_blurry: bool,
}

impl Default for AiRequirements {
    fn default() -> Self {
        Self {
            enabled: true,
            prompt: String::new(),
            required_objects: Vec::new(),
            minimum_confidence: default_min_confidence(),
            require_face: false,
            require_selfie: false,
            reject_blurry: true,
        }
    }
}

/// Admission limits checked before verification and re-checked atomically
/// when a completion is claimed.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionLimits {
    #[serde(default = "default_true")]
    pub active: bool,

    #[serde(default)]
    pub expires_at: Option<Timestamp>,

    #[serde(default)]
    pub max_completions: Option<u32>,

    #[serde(default = "default_max_per_user")]
    pub max_per_user: u32,

    /// Day boundaries follow [`QuestRequirement::timezone`].
    #[serde(default)]
    pub daily_limit_per_user: Option<u32>,

    #[serde(default)]
    pub reward_per_completion: u64,

    #[serde(default)]
    pub reward_budget: Option<u64>,
}

impl Default for CompletionLimits {
    fn default() -> Self {
        Self {
            active: true,
            expires_at: None,
            max_completions: None,
            max_per_user: default_max_per_user(),
            daily_limit_per_user: None,
            reward_per_completion: 0,
            reward_budget: None,
        }
    }
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_true() -> bool {
    true
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_min_confidence() -> f64 {
    0.7
}

fn default_max_per_user() -> u32 {
    1
}
