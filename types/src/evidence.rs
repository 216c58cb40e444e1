//! User-submitted proof for a single attempt. Immutable once created.

use crate::{GeoPoint, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionEvidence {
    #[serde(default)]
    pub coordinates: Option<Coordinates>,

    /// When the proof was captured on the device. Falls back to "now".
    #[serde(default)]
    pub captured_at: Option<Timestamp>,

    #[serde(default)]
    pub scanned_code: Option<String>,

    #[serde(default)]
    pub image: Option<ImagePayload>,

    #[serde(default)]
    pub device: Option<DeviceTelemetry>,
}

/// A device GPS fix.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub altitude: Option<f64>,
    #[serde(default)]
    pub heading: Option<f64>,
    #[serde(default)]
    pub speed: Option<f64>,
}

impl Coordinates {
    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy: None,
            altitude: None,
            heading: None,
            speed: None,
        }
    }

    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// Raw image bytes; base64 on the wire.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePayload {
    pub content_type: String,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

impl ImagePayload {
    pub fn new(content_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            content_type: content_type.into(),
            data,
        }
    }
}

impl std::fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImagePayload")
            .field("content_type", &self.content_type)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Device signals used by the anti-spoofing gate.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceTelemetry {
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub is_emulator: bool,
    #[serde(default)]
    pub is_mock_location: bool,
    /// Spoofing flags previously raised against this device.
    #[serde(default)]
    pub prior_flags: u32,
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(d)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_is_base64_on_the_wire() {
        let img = ImagePayload::new("image/jpeg", vec![0xff, 0xd8, 0xff]);
        let json = serde_json::to_value(&img).unwrap();
        assert_eq!(json["data"], "/9j/");
        let back: ImagePayload = serde_json::from_value(json).unwrap();
        assert_eq!(back, img);
    }

    #[test]
    fn evidence_parses_camel_case() {
        let json = r#"{
            "coordinates": { "latitude": 1.5, "longitude": 2.5, "accuracy": 8.0 },
            "capturedAt": 1700000000000,
            "scannedCode": "ABC123",
            "device": { "platform": "android", "isEmulator": true }
        }"#;
        let ev: SubmissionEvidence = serde_json::from_str(json).unwrap();
        assert_eq!(ev.coordinates.unwrap().accuracy, Some(8.0));
        assert_eq!(ev.captured_at, Some(Timestamp::from_millis(1_700_000_000_000)));
        let device = ev.device.unwrap();
        assert!(device.is_emulator);
        assert!(!device.is_mock_location);
        assert_eq!(device.prior_flags, 0);
    }
}
