//! Engine configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::Path;

use quest_verification::AntiSpoofingConfig;
use quest_vision::VisionConfig;

use crate::logging::LogFormat;
use crate::EngineError;

/// Configuration for the quest engine.
///
/// Can be loaded from a TOML file via [`EngineConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Log output format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter (e.g. "info", "debug,quest_vision=trace").
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whether to collect Prometheus metrics.
    #[serde(default)]
    pub enable_metrics: bool,

    /// Image classifier connection.
    #[serde(default)]
    pub vision: VisionConfig,

    /// Device risk penalties and threshold.
    #[serde(default)]
    pub anti_spoofing: AntiSpoofingConfig,
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, EngineError> {
        let config: Self = toml::from_str(s).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, EngineError> {
        toml::to_string_pretty(self).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// A copy safe to print: the classifier API key is masked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.vision.api_key.is_some() {
            copy.vision.api_key = Some("********".to_string());
        }
        copy
    }

    pub fn log_format(&self) -> Result<LogFormat, EngineError> {
        self.log_format.parse()
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        self.log_format()?;
        if self.vision.timeout_secs == 0 {
            return Err(EngineError::Config("vision.timeout_secs must be positive".into()));
        }
        let spoof = &self.anti_spoofing;
        let penalties = [
            spoof.emulator_penalty,
            spoof.mock_location_penalty,
            spoof.prior_flag_penalty,
        ];
        if penalties.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return Err(EngineError::Config(
                "anti_spoofing penalties must be non-negative".into(),
            ));
        }
        if !(0.0..=1.0).contains(&spoof.threshold) {
            return Err(EngineError::Config(
                "anti_spoofing.threshold must be within [0, 1]".into(),
            ));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_format: default_log_format(),
            log_level: default_log_level(),
            enable_metrics: false,
            vision: VisionConfig::default(),
            anti_spoofing: AntiSpoofingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quest_vision::UnconfiguredPolicy;
    use std::io::Write;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = EngineConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        let parsed = EngineConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = EngineConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.log_format, "human");
        assert_eq!(config.vision.timeout_secs, 30);
        assert_eq!(config.vision.unconfigured_policy, UnconfiguredPolicy::Refuse);
        assert_eq!(config.anti_spoofing.threshold, 0.5);
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            log_format = "json"

            [vision]
            endpoint = "https://vision.internal"
            unconfigured_policy = "stand_in"

            [anti_spoofing]
            emulator_penalty = 0.3
        "#;
        let config = EngineConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.log_format().unwrap(), LogFormat::Json);
        assert_eq!(config.vision.endpoint.as_deref(), Some("https://vision.internal"));
        assert_eq!(config.vision.unconfigured_policy, UnconfiguredPolicy::StandIn);
        assert_eq!(config.anti_spoofing.emulator_penalty, 0.3);
        assert_eq!(config.anti_spoofing.mock_location_penalty, 0.6); // default
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(EngineConfig::from_toml_str("log_format = \"yaml\"").is_err());
        assert!(EngineConfig::from_toml_str("[anti_spoofing]\nthreshold = 2.0").is_err());
        assert!(EngineConfig::from_toml_str("[vision]\ntimeout_secs = 0").is_err());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "log_level = \"debug\"\nenable_metrics = true").unwrap();
        let config = EngineConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.log_level, "debug");
        assert!(config.enable_metrics);
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = EngineConfig::from_toml_file("/nonexistent/questd.toml");
        assert!(matches!(result, Err(EngineError::Config(_))));
    }

    #[test]
    fn redaction_masks_api_key() {
        let mut config = EngineConfig::default();
        config.vision.api_key = Some("sk-live-123".into());
        let shown = config.redacted().to_toml_string().unwrap();
        assert!(!shown.contains("sk-live-123"));
    }
}
