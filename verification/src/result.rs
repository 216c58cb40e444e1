//! The per-attempt verification record.
//!
//! A [`VerificationResult`] is written only by the orchestrator and becomes
//! read-only once it leaves `pending`: every mutator checks that and returns
//! an error instead of writing.

use crate::anti_spoofing::SpoofCheck;
use crate::geo::GeoCheck;
use crate::qr::QrCheck;
use crate::time_window::TimeWindowCheck;
use crate::VerificationError;
use quest_types::{FailureCode, LayerKind, Timestamp};
use quest_vision::{AiVisionCheck, Provenance};
use serde::{Deserialize, Serialize};

/// A layer that could not be evaluated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerError {
    pub kind: LayerKind,
    /// True for configuration problems, false for unreachable collaborators.
    pub configuration: bool,
    pub message: String,
}

/// Outcome of one layer. Each variant has a fixed field set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "layer", rename_all = "snake_case")]
pub enum LayerResult {
    AntiSpoofing(SpoofCheck),
    Gps(GeoCheck),
    Time(TimeWindowCheck),
    QrScan(QrCheck),
    AiVision(AiVisionCheck),
    Errored(LayerError),
}

impl LayerResult {
    pub fn kind(&self) -> LayerKind {
        match self {
            Self::AntiSpoofing(_) => LayerKind::AntiSpoofing,
            Self::Gps(_) => LayerKind::Gps,
            Self::Time(_) => LayerKind::Time,
            Self::QrScan(_) => LayerKind::QrScan,
            Self::AiVision(_) => LayerKind::AiVision,
            Self::Errored(e) => e.kind,
        }
    }

    pub fn passed(&self) -> bool {
        match self {
            Self::AntiSpoofing(c) => c.passed,
            Self::Gps(c) => c.passed,
            Self::Time(c) => c.passed,
            Self::QrScan(c) => c.passed,
            Self::AiVision(c) => c.passed,
            Self::Errored(_) => false,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::AntiSpoofing(c) => &c.message,
            Self::Gps(c) => &c.message,
            Self::Time(c) => &c.message,
            Self::QrScan(c) => &c.message,
            Self::AiVision(c) => &c.message,
            Self::Errored(e) => &e.message,
        }
    }

    /// Whether the layer failed for reasons other than the submission itself.
    pub fn is_infrastructure_failure(&self) -> bool {
        matches!(self, Self::Errored(_))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallResult {
    Pending,
    Passed,
    Failed,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    layers: Vec<LayerResult>,
    overall: OverallResult,
    score: f64,
    failure_code: Option<FailureCode>,
    failure_message: Option<String>,
    started_at: Timestamp,
    finished_at: Option<Timestamp>,
    duration_ms: Option<u64>,
    infrastructure_failure: bool,
    unverified_layers: Vec<LayerKind>,
}

impl VerificationResult {
    /// A fresh pending result.
    pub fn begin(started_at: Timestamp) -> Self {
        Self {
            layers: Vec::new(),
            overall: OverallResult::Pending,
            score: 0.0,
            failure_code: None,
            failure_message: None,
            started_at,
            finished_at: None,
            duration_ms: None,
            infrastructure_failure: false,
            unverified_layers: Vec::new(),
        }
    }

    /// Append a layer outcome. Fails once the result is final or if the
    /// layer was already recorded.
    pub fn record(&mut self, layer: LayerResult) -> Result<(), VerificationError> {
        let kind = layer.kind();
        if self.is_final() {
            return Err(VerificationError::ResultFinalized(kind));
        }
        if self.layers.iter().any(|l| l.kind() == kind) {
            return Err(VerificationError::DuplicateLayer(kind));
        }
        if layer.is_infrastructure_failure() {
            self.infrastructure_failure = true;
        }
        if let LayerResult::AiVision(check) = &layer {
            if check.provenance == Provenance::UnverifiedStandIn {
                self.unverified_layers.push(kind);
            }
        }
        self.layers.push(layer);
        Ok(())
    }

    /// Finalize as passed.
    pub fn pass(&mut self, finished_at: Timestamp) -> Result<(), VerificationError> {
        self.finish(OverallResult::Passed, finished_at)
    }

    /// Finalize as failed with exactly one code.
    pub fn fail(
        &mut self,
        code: FailureCode,
        message: impl Into<String>,
        finished_at: Timestamp,
    ) -> Result<(), VerificationError> {
        self.finish(OverallResult::Failed, finished_at)?;
        self.failure_code = Some(code);
        self.failure_message = Some(message.into());
        Ok(())
    }

    fn finish(&mut self, overall: OverallResult, at: Timestamp) -> Result<(), VerificationError> {
        if self.is_final() {
            return Err(VerificationError::AlreadyFinal);
        }
        self.overall = overall;
        self.score = score(&self.layers);
        self.finished_at = Some(at);
        self.duration_ms = Some(self.started_at.elapsed_since(at));
        Ok(())
    }

    pub fn is_final(&self) -> bool {
        self.overall != OverallResult::Pending
    }

    pub fn layers(&self) -> &[LayerResult] {
        &self.layers
    }

    pub fn layer(&self, kind: LayerKind) -> Option<&LayerResult> {
        self.layers.iter().find(|l| l.kind() == kind)
    }

    pub fn overall(&self) -> OverallResult {
        self.overall
    }

    pub fn passed(&self) -> bool {
        self.overall == OverallResult::Passed
    }

    /// Passed layers over executed layers; `1.0` when nothing ran.
    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn failure_code(&self) -> Option<FailureCode> {
        self.failure_code
    }

    pub fn failure_message(&self) -> Option<&str> {
        self.failure_message.as_deref()
    }

    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<Timestamp> {
        self.finished_at
    }

    pub fn duration_ms(&self) -> Option<u64> {
        self.duration_ms
    }

    pub fn infrastructure_failure(&self) -> bool {
        self.infrastructure_failure
    }

    /// Layers that passed without a real check (stand-in AI).
    pub fn unverified_layers(&self) -> &[LayerKind] {
        &self.unverified_layers
    }
}

fn score(layers: &[LayerResult]) -> f64 {
    if layers.is_empty() {
        return 1.0;
    }
    let passed = layers.iter().filter(|l| l.passed()).count();
    passed as f64 / layers.len() as f64
}
