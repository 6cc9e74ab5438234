//! Whole-run configuration, loadable from a single JSON document.

use serde::{Deserialize, Serialize};
use tessel_explore::GenConfig;
use tessel_sandbox::ExecConfig;

use crate::filter::OutputConfig;
use crate::limits::RunLimits;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    #[serde(rename = "generation")]
    pub gen: GenConfig,
    #[serde(rename = "execution")]
    pub exec: ExecConfig,
    pub limits: RunLimits,
    pub output: OutputConfig,
}

impl RunConfig {
    /// Parse a config document. Missing sections and fields take their
    /// defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::OutputMode;

    #[test]
    fn test_sections_default_independently() {
        let config = RunConfig::from_json(
            r#"{
                "generation": {"seed": 3, "null_ratio": 0.0},
                "limits": {"max_steps": 50},
                "output": {"mode": "all"}
            }"#,
        )
        .unwrap();
        assert_eq!(config.gen.seed, 3);
        assert_eq!(config.gen.max_size, 100);
        assert_eq!(config.limits.max_steps, 50);
        assert_eq!(config.output.mode, OutputMode::All);
        assert_eq!(config.exec, ExecConfig::default());
    }

    #[test]
    fn test_round_trip() {
        let config = RunConfig::default();
        let back = RunConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(back, config);
    }
}
