//! Analysis configuration
//!
//! Every field has a default, so a JSON file only needs the values it changes:
//!
//! ```json
//! { "outlier": { "contamination": 0.2 }, "lowest_count": 5 }
//! ```

use serde::{Deserialize, Serialize};

use crate::{
    ConfigurationError, gap::GapThresholds, outlier::OutlierConfig,
    vulnerability::VulnerabilityConfig,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub outlier: OutlierConfig,
    pub gap: GapThresholds,
    pub vulnerability: VulnerabilityConfig,
    /// Number of lowest districts listed in scheme reports.
    pub lowest_count: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            outlier: OutlierConfig::default(),
            gap: GapThresholds::default(),
            vulnerability: VulnerabilityConfig::default(),
            lowest_count: 10,
        }
    }
}

impl AnalysisConfig {
    /// Checks every section.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigurationError`] found.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.outlier.validate()?;
        self.gap.validate()?;
        self.vulnerability.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        AnalysisConfig::default().validate().unwrap();
    }

    #[test]
    fn test_partial_json_overrides_named_fields() {
        let config: AnalysisConfig = serde_json::from_str(
            r#"{ "outlier": { "contamination": 0.2 }, "gap": { "low_mean": 0.5 }, "lowest_count": 5 }"#,
        )
        .unwrap();
        assert_eq!(config.outlier.contamination, 0.2);
        assert_eq!(config.outlier.n_estimators, 300);
        assert_eq!(config.outlier.seed, 42);
        assert_eq!(config.gap.low_mean, 0.5);
        assert_eq!(config.gap.zero_threshold, 0.05);
        assert_eq!(config.vulnerability, VulnerabilityConfig::default());
        assert_eq!(config.lowest_count, 5);
    }

    #[test]
    fn test_empty_json_is_default() {
        let config: AnalysisConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, AnalysisConfig::default());
    }

    #[test]
    fn test_invalid_section_is_reported() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{ "outlier": { "contamination": 0.5 } }"#).unwrap();
        assert_eq!(
            config.validate(),
            Err(ConfigurationError::ContaminationOutOfRange { value: 0.5 })
        );

        let config: AnalysisConfig =
            serde_json::from_str(r#"{ "vulnerability": { "high_level": -1.0 } }"#).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidParameter { name: "high_level", .. })
        ));
    }
}
