//! Verification orchestrator: runs the selected layers for one submission
//! and produces a single immutable [`VerificationResult`].

use crate::anti_spoofing::AntiSpoofingGate;
use crate::error::VerificationError;
use crate::geo::GeoVerifier;
use crate::layers::select_layers;
use crate::qr::QrVerifier;
use crate::result::{LayerError, LayerResult, VerificationResult};
use crate::time_window::TimeWindowVerifier;
use quest_types::{
    AiRequirements, Clock, FailureCode, LayerKind, QuestRequirement, SubmissionEvidence,
    TimeWindowConfig,
};
use quest_vision::VisionAdapter;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Prefix on messages for layers that failed because of configuration or
/// unreachable collaborators rather than the submission.
pub const INFRASTRUCTURE_PREFIX: &str = "infrastructure error:";

/// Runs anti-spoofing first (when telemetry is present), then
/// gps → time → qr_scan → ai_vision, stopping at the first failure.
pub struct VerificationOrchestrator {
    anti_spoofing: AntiSpoofingGate,
    geo: GeoVerifier,
    time: TimeWindowVerifier,
    qr: QrVerifier,
    vision: VisionAdapter,
    clock: Arc<dyn Clock>,
}

impl VerificationOrchestrator {
    pub fn new(anti_spoofing: AntiSpoofingGate, vision: VisionAdapter, clock: Arc<dyn Clock>) -> Self {
        Self {
            anti_spoofing,
            geo: GeoVerifier,
            time: TimeWindowVerifier,
            qr: QrVerifier,
            vision,
            clock,
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Verify `evidence` against `requirement`.
    ///
    /// Verification failures are part of the returned result. `Err` is only
    /// returned if the result itself rejects a write, which means a bug here.
    pub async fn verify(
        &self,
        requirement: &QuestRequirement,
        evidence: &SubmissionEvidence,
    ) -> Result<VerificationResult, VerificationError> {
        let mut result = VerificationResult::begin(self.clock.now());
        let layers = select_layers(requirement);
        debug!(layers = ?layers, "verification started");

        if let Some(device) = &evidence.device {
            let check = self.anti_spoofing.check(device);
            let passed = check.passed;
            let message = check.message.clone();
            debug!(risk = check.risk_score, passed, "anti_spoofing layer");
            result.record(LayerResult::AntiSpoofing(check))?;
            if !passed {
                info!(%message, "submission rejected as spoofed");
                result.fail(FailureCode::SpoofingDetected, message, self.clock.now())?;
                return Ok(result);
            }
        }

        for kind in layers {
            let Some(layer) = self.run_layer(kind, requirement, evidence).await else {
                continue;
            };
            let passed = layer.passed();
            let message = layer.message().to_string();
            if layer.is_infrastructure_failure() {
                warn!(layer = %kind, %message, "layer could not be evaluated");
            } else {
                debug!(layer = %kind, passed, %message, "layer evaluated");
            }
            result.record(layer)?;

            if !passed {
                info!(layer = %kind, code = %kind.failure_code(), "verification failed");
                result.fail(kind.failure_code(), message, self.clock.now())?;
                return Ok(result);
            }
        }

        result.pass(self.clock.now())?;
        Ok(result)
    }

    /// Evaluate one selected layer. `None` for anti-spoofing, which gates
    /// the whole submission before any layer runs.
    async fn run_layer(
        &self,
        kind: LayerKind,
        requirement: &QuestRequirement,
        evidence: &SubmissionEvidence,
    ) -> Option<LayerResult> {
        let layer = match kind {
            LayerKind::AntiSpoofing => return None,
            LayerKind::Gps => match &requirement.location {
                Some(target) => {
                    let point = evidence.coordinates.as_ref().map(|c| c.point());
                    LayerResult::Gps(self.geo.verify(point, target))
                }
                None => configuration_error(kind, "gps layer selected but no target location is configured"),
            },
            LayerKind::Time => {
                let at = evidence.captured_at.unwrap_or_else(|| self.clock.now());
                let unrestricted = TimeWindowConfig::default();
                let config = requirement.time_window.as_ref().unwrap_or(&unrestricted);
                match self.time.verify(config, at) {
                    Ok(check) => LayerResult::Time(check),
                    Err(e) => layer_error(kind, &e),
                }
            }
            LayerKind::QrScan => match &requirement.qr_code_hash {
                Some(hash) => LayerResult::QrScan(self.qr.verify(evidence.scanned_code.as_deref(), hash)),
                None => configuration_error(kind, "qr_scan layer selected but no QR hash is configured"),
            },
            LayerKind::AiVision => {
                let defaults = AiRequirements::default();
                let ai = requirement.ai.as_ref().unwrap_or(&defaults);
                match self.vision.verify(evidence.image.as_ref(), ai).await {
                    Ok(check) => LayerResult::AiVision(check),
                    Err(e) => layer_error(kind, &VerificationError::from(e)),
                }
            }
        };
        Some(layer)
    }
}

fn layer_error(kind: LayerKind, error: &VerificationError) -> LayerResult {
    let detail: &dyn fmt::Display = match error {
        VerificationError::Vision(inner) => inner,
        other => other,
    };
    LayerResult::Errored(LayerError {
        kind,
        configuration: error.is_configuration(),
        message: format!("{INFRASTRUCTURE_PREFIX} {detail}"),
    })
}

fn configuration_error(kind: LayerKind, detail: &str) -> LayerResult {
    LayerResult::Errored(LayerError {
        kind,
        configuration: true,
        message: format!("{INFRASTRUCTURE_PREFIX} {detail}"),
    })
}
