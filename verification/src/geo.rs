//! Distance gate between a submitted fix and a target point.

use quest_types::{GeoPoint, GeoTarget};
use quest_utils::format_distance;
use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Great-circle distance in meters (haversine).
pub fn haversine_distance(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    // Rounding can push h just outside [0, 1] for near-antipodal points.
    let h = ((dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2))
        .clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_METERS * c
}

/// Outcome of the GPS layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoCheck {
    pub passed: bool,
    /// `None` when no coordinates were submitted.
    pub distance_meters: Option<f64>,
    pub radius_meters: f64,
    pub message: String,
}

/// Stateless GPS verifier.
#[derive(Clone, Copy, Debug, Default)]
pub struct GeoVerifier;

impl GeoVerifier {
    pub fn verify(&self, submitted: Option<GeoPoint>, target: &GeoTarget) -> GeoCheck {
        let Some(point) = submitted else {
            return GeoCheck {
                passed: false,
                distance_meters: None,
                radius_meters: target.radius_meters,
                message: "location data not provided".to_string(),
            };
        };

        let distance = haversine_distance(point, target.coordinates);
        let passed = distance <= target.radius_meters;
        let message = if passed {
            format!("Location verified ({} from target)", format_distance(distance))
        } else {
            format!("You're {}m away. Get closer!", distance.round() as u64)
        };

        GeoCheck {
            passed,
            distance_meters: Some(distance),
            radius_meters: target.radius_meters,
            message,
        }
    }
}
