//! Device-telemetry risk gate.

use quest_types::DeviceTelemetry;
use serde::{Deserialize, Serialize};

/// Penalties and threshold (`[anti_spoofing]` in the engine config).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AntiSpoofingConfig {
    #[serde(default = "default_emulator_penalty")]
    pub emulator_penalty: f64,
    #[serde(default = "default_mock_location_penalty")]
    pub mock_location_penalty: f64,
    #[serde(default = "default_prior_flag_penalty")]
    pub prior_flag_penalty: f64,
    /// Risk at or below this passes.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_emulator_penalty() -> f64 {
    0.6
}

fn default_mock_location_penalty() -> f64 {
    0.6
}

fn default_prior_flag_penalty() -> f64 {
    0.1
}

fn default_threshold() -> f64 {
    0.5
}

impl Default for AntiSpoofingConfig {
    fn default() -> Self {
        Self {
            emulator_penalty: default_emulator_penalty(),
            mock_location_penalty: default_mock_location_penalty(),
            prior_flag_penalty: default_prior_flag_penalty(),
            threshold: default_threshold(),
        }
    }
}

/// Outcome of the anti-spoofing layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpoofCheck {
    pub passed: bool,
    pub risk_score: f64,
    /// Signals that contributed to the score.
    pub signals: Vec<String>,
    pub message: String,
}

#[derive(Clone, Debug, Default)]
pub struct AntiSpoofingGate {
    config: AntiSpoofingConfig,
}

impl AntiSpoofingGate {
    pub fn new(config: AntiSpoofingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AntiSpoofingConfig {
        &self.config
    }

    /// Risk in `[0, 1]` for one device report.
    pub fn risk_score(&self, device: &DeviceTelemetry) -> (f64, Vec<String>) {
        let mut risk = 0.0;
        let mut signals = Vec::new();
        if device.is_emulator {
            risk += self.config.emulator_penalty;
            signals.push("emulator".to_string());
        }
        if device.is_mock_location {
            risk += self.config.mock_location_penalty;
            signals.push("mock_location".to_string());
        }
        if device.prior_flags > 0 {
            risk += self.config.prior_flag_penalty * f64::from(device.prior_flags);
            signals.push(format!("prior_flags:{}", device.prior_flags));
        }
        (risk.clamp(0.0, 1.0), signals)
    }

    pub fn check(&self, device: &DeviceTelemetry) -> SpoofCheck {
        let (risk_score, signals) = self.risk_score(device);
        let passed = risk_score <= self.config.threshold;
        let message = if passed {
            "device checks passed".to_string()
        } else {
            format!(
                "suspicious device detected (risk {risk_score:.2}: {})",
                signals.join(", ")
            )
        };
        SpoofCheck {
            passed,
            risk_score,
            signals,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(emulator: bool, mock: bool, flags: u32) -> DeviceTelemetry {
        DeviceTelemetry {
            platform: Some("android".into()),
            is_emulator: emulator,
            is_mock_location: mock,
            prior_flags: flags,
        }
    }

    #[test]
    fn clean_device_passes_with_zero_risk() {
        let check = AntiSpoofingGate::default().check(&device(false, false, 0));
        assert!(check.passed);
        assert_eq!(check.risk_score, 0.0);
        assert!(check.signals.is_empty());
    }

    #[test]
    fn emulator_alone_fails() {
        let check = AntiSpoofingGate::default().check(&device(true, false, 0));
        assert!(!check.passed);
        assert!(check.message.contains("emulator"));
    }

    #[test]
    fn risk_is_clamped() {
        let check = AntiSpoofingGate::default().check(&device(true, true, 40));
        assert_eq!(check.risk_score, 1.0);
    }

    #[test]
    fn prior_flags_accumulate() {
        let gate = AntiSpoofingGate::default();
        assert!(gate.check(&device(false, false, 5)).passed);
        assert!(!gate.check(&device(false, false, 6)).passed);
    }

    #[test]
    fn penalties_are_configurable() {
        let gate = AntiSpoofingGate::new(AntiSpoofingConfig {
            emulator_penalty: 0.2,
            ..AntiSpoofingConfig::default()
        });
        assert!(gate.check(&device(true, false, 0)).passed);
    }
}
