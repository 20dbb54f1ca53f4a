//! Analysis configuration
//!
//! Tunable constants of the analysis, persisted as JSON.

use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default engagement ratio ceiling for display
pub const DEFAULT_ENGAGEMENT_CLIP: f64 = 1.2;

/// Default histogram bin width for app usage (minutes)
pub const DEFAULT_APP_USAGE_BIN_WIDTH: f64 = 15.0;

/// Default histogram bin width for screen-on time (hours)
pub const DEFAULT_SCREEN_ON_BIN_WIDTH: f64 = 0.5;

/// Default significance level for demographic tests
pub const DEFAULT_SIGNIFICANCE_LEVEL: f64 = 0.05;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Upper bound applied to the engagement ratio
    pub engagement_clip: f64,
    pub app_usage_bin_width: f64,
    pub screen_on_bin_width: f64,
    /// Alpha for demographic significance tests
    pub significance_level: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            engagement_clip: DEFAULT_ENGAGEMENT_CLIP,
            app_usage_bin_width: DEFAULT_APP_USAGE_BIN_WIDTH,
            screen_on_bin_width: DEFAULT_SCREEN_ON_BIN_WIDTH,
            significance_level: DEFAULT_SIGNIFICANCE_LEVEL,
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from JSON; absent fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, AnalysisError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, AnalysisError> {
        let json = fs::read_to_string(path).map_err(|e| {
            AnalysisError::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, AnalysisError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !(self.engagement_clip.is_finite() && self.engagement_clip > 0.0) {
            return Err(AnalysisError::InvalidConfig(format!(
                "engagement_clip must be positive, got {}",
                self.engagement_clip
            )));
        }
        for (name, width) in [
            ("app_usage_bin_width", self.app_usage_bin_width),
            ("screen_on_bin_width", self.screen_on_bin_width),
        ] {
            if !(width.is_finite() && width > 0.0) {
                return Err(AnalysisError::InvalidConfig(format!(
                    "{} must be positive, got {}",
                    name, width
                )));
            }
        }
        if !(self.significance_level > 0.0 && self.significance_level < 1.0) {
            return Err(AnalysisError::InvalidConfig(format!(
                "significance_level must be in (0, 1), got {}",
                self.significance_level
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.engagement_clip, 1.2);
        assert_eq!(config.app_usage_bin_width, 15.0);
        assert_eq!(config.screen_on_bin_width, 0.5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = AnalysisConfig::from_json(r#"{"engagement_clip": 1.0}"#).unwrap();
        assert_eq!(config.engagement_clip, 1.0);
        assert_eq!(config.significance_level, DEFAULT_SIGNIFICANCE_LEVEL);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            AnalysisConfig::from_json(r#"{"app_usage_bin_width": 0}"#),
            Err(AnalysisError::InvalidConfig(_))
        ));
        assert!(AnalysisConfig::from_json(r#"{"significance_level": 1.5}"#).is_err());
        assert!(AnalysisConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_file_round_trip() {
        let config = AnalysisConfig {
            screen_on_bin_width: 1.0,
            ..AnalysisConfig::default()
        };
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(config.to_json().unwrap().as_bytes()).unwrap();

        let loaded = AnalysisConfig::from_file(file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file() {
        let result = AnalysisConfig::from_file(Path::new("/nonexistent/screenlens.json"));
        assert!(matches!(result, Err(AnalysisError::InvalidConfig(_))));
    }
}
