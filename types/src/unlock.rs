//! Chapter unlock conditions and history records.

use crate::{GeoTarget, TimeWindowConfig, Timestamp, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Gates protecting a story chapter. Binary: unlocked or locked.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockCondition {
    #[serde(default)]
    pub location: Option<GeoTarget>,

    #[serde(default)]
    pub time_window: Option<TimeWindowConfig>,

    /// SHA-256 (lower-case hex) of the expected QR payload.
    #[serde(default)]
    pub qr_code_hash: Option<String>,

    /// Argon2 PHC string of the chapter password.
    #[serde(default)]
    pub password_hash: Option<String>,

    #[serde(default)]
    pub requires_previous: bool,
}

/// What the caller submits when trying to unlock a chapter.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockPayload {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub qr_code: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// The gate that admitted a user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnlockMethod {
    Open,
    Location,
    Time,
    Qr,
    Password,
}

impl fmt::Display for UnlockMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Open => "open",
            Self::Location => "location",
            Self::Time => "time",
            Self::Qr => "qr",
            Self::Password => "password",
        };
        f.write_str(s)
    }
}

/// One entry in a chapter's append-only unlock history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockRecord {
    pub user: UserId,
    pub unlocked_at: Timestamp,
    pub method: UnlockMethod,
}
