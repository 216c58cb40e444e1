//! Quest completion verification.
//!
//! Deterministic verifiers (GPS, time window, QR, anti-spoofing) plus the AI
//! vision adapter, composed by the [`VerificationOrchestrator`] into one
//! immutable [`VerificationResult`] per attempt. The [`CompletionAttempt`]
//! state machine tracks the attempt lifecycle, and chapters reuse the same
//! verifiers through the [`UnlockConditionEvaluator`].

pub mod anti_spoofing;
pub mod error;
pub mod geo;
pub mod layers;
pub mod orchestrator;
pub mod qr;
pub mod result;
pub mod state;
pub mod time_window;
pub mod unlock;

pub use anti_spoofing::{AntiSpoofingConfig, AntiSpoofingGate, SpoofCheck};
pub use error::VerificationError;
pub use geo::{haversine_distance, GeoCheck, GeoVerifier, EARTH_RADIUS_METERS};
pub use layers::select_layers;
pub use orchestrator::{VerificationOrchestrator, INFRASTRUCTURE_PREFIX};
pub use qr::{QrCheck, QrVerifier};
pub use result::{LayerError, LayerResult, OverallResult, VerificationResult};
pub use state::{AttemptState, AttemptStateKind, CompletionAttempt};
pub use time_window::{TimeRule, TimeWindowCheck, TimeWindowVerifier};
pub use unlock::{Chapter, UnlockConditionEvaluator, UnlockDecision, UnlockHistory, UnlockOutcome};
