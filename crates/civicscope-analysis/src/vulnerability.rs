//! District social-vulnerability scoring
//!
//! A weighted linear composite of four indicators, each expected in `[0, 1]`:
//!
//! | Indicator    | Direction           | Default weight |
//! |--------------|---------------------|----------------|
//! | `economic`   | higher = vulnerable | 0.30           |
//! | `health`     | higher = vulnerable | 0.25           |
//! | `volatility` | higher = vulnerable | 0.25           |
//! | `education`  | higher = stable     | 0.20 (on `1 - education`) |
//!
//! The scorer does not check ranges. Indicators outside `[0, 1]` give a score
//! outside `[0, 1]`, which is still bucketed by the same thresholds.
//!
//! Unlike the gap classifier, a profile always has at least one driver entry:
//! [`NO_MAJOR_DRIVER`] stands in when no indicator crosses its threshold.

use civicscope_data::{
    SchemaError,
    normalize::{NormalizeSpec, NormalizedTable},
};
use serde::{Deserialize, Serialize};

use crate::{ConfigurationError, check_parameter};

/// Driver entry reported when no indicator crosses its threshold.
pub const NO_MAJOR_DRIVER: &str = "No major vulnerability drivers detected";

/// Weights, level cut-offs and driver thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VulnerabilityConfig {
    pub economic_weight: f64,
    pub health_weight: f64,
    pub volatility_weight: f64,
    /// Applied to `1 - education`.
    pub education_weight: f64,
    /// Scores at or above this are HIGH.
    pub high_level: f64,
    /// Scores at or above this (and below `high_level`) are MODERATE.
    pub moderate_level: f64,
    pub economic_driver_above: f64,
    pub education_driver_below: f64,
    pub health_driver_above: f64,
    pub volatility_driver_above: f64,
}

impl Default for VulnerabilityConfig {
    fn default() -> Self {
        Self {
            economic_weight: 0.30,
            health_weight: 0.25,
            volatility_weight: 0.25,
            education_weight: 0.20,
            high_level: 0.65,
            moderate_level: 0.45,
            economic_driver_above: 0.65,
            education_driver_below: 0.45,
            health_driver_above: 0.65,
            volatility_driver_above: 0.60,
        }
    }
}

impl VulnerabilityConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        check_parameter("economic_weight", self.economic_weight)?;
        check_parameter("health_weight", self.health_weight)?;
        check_parameter("volatility_weight", self.volatility_weight)?;
        check_parameter("education_weight", self.education_weight)?;
        check_parameter("high_level", self.high_level)?;
        check_parameter("moderate_level", self.moderate_level)?;
        check_parameter("economic_driver_above", self.economic_driver_above)?;
        check_parameter("education_driver_below", self.education_driver_below)?;
        check_parameter("health_driver_above", self.health_driver_above)?;
        check_parameter("volatility_driver_above", self.volatility_driver_above)?;
        Ok(())
    }
}

/// The four normalized indicators of one district.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VulnerabilityIndicators {
    #[serde(rename = "economic_dependency")]
    pub economic: f64,
    #[serde(rename = "education_stability")]
    pub education: f64,
    #[serde(rename = "health_dependency")]
    pub health: f64,
    pub volatility: f64,
}

impl VulnerabilityIndicators {
    /// Source columns, in field order.
    pub const COLUMNS: [&str; 4] = [
        "economic_dependency",
        "education_stability",
        "health_dependency",
        "volatility",
    ];

    /// How an indicator table is normalized: keyed by `district`, with all
    /// four indicator columns required.
    #[must_use]
    pub fn normalize_spec() -> NormalizeSpec {
        NormalizeSpec::new("district", Self::COLUMNS)
    }

    /// Reads the indicators of `district` from a normalized table.
    ///
    /// Returns `Ok(None)` if the district is not in the table.
    ///
    /// # Errors
    ///
    /// * [`SchemaError::MissingColumn`] - an indicator column is absent
    pub fn from_record(
        table: &NormalizedTable,
        district: &str,
    ) -> Result<Option<Self>, SchemaError> {
        let column = |name: &str| {
            table
                .column_index(name)
                .ok_or_else(|| SchemaError::MissingColumn {
                    column: name.to_owned(),
                    available: table.columns().to_vec(),
                })
        };
        let [economic, education, health, volatility] = Self::COLUMNS;
        let (economic, education, health, volatility) = (
            column(economic)?,
            column(education)?,
            column(health)?,
            column(volatility)?,
        );
        Ok(table.get(district).map(|record| Self {
            economic: record.values[economic],
            education: record.values[education],
            health: record.values[health],
            volatility: record.values[volatility],
        }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, derive_more::Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VulnerabilityLevel {
    #[display("HIGH")]
    High,
    #[display("MODERATE")]
    Moderate,
    #[display("LOW")]
    Low,
}

impl VulnerabilityLevel {
    #[must_use]
    pub const fn interpretation(self) -> &'static str {
        match self {
            Self::High => {
                "High social vulnerability. Preventive intervention is strongly recommended."
            }
            Self::Moderate => "Moderate vulnerability. Continuous monitoring is advised.",
            Self::Low => "Low vulnerability. Social conditions are relatively stable.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VulnerabilityProfile {
    pub indicators: VulnerabilityIndicators,
    pub score: f64,
    pub level: VulnerabilityLevel,
    /// Never empty; holds [`NO_MAJOR_DRIVER`] alone when nothing stands out.
    pub drivers: Vec<&'static str>,
    pub interpretation: &'static str,
}

impl VulnerabilityProfile {
    /// Returns `true` if at least one indicator crossed its driver threshold.
    #[must_use]
    pub fn has_drivers(&self) -> bool {
        self.drivers != [NO_MAJOR_DRIVER]
    }
}

#[derive(Debug, Clone)]
pub struct VulnerabilityScorer {
    config: VulnerabilityConfig,
}

impl VulnerabilityScorer {
    #[must_use]
    pub fn new(config: VulnerabilityConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &VulnerabilityConfig {
        &self.config
    }

    #[must_use]
    pub fn score(&self, indicators: &VulnerabilityIndicators) -> VulnerabilityProfile {
        let c = &self.config;
        let score = c.economic_weight * indicators.economic
            + c.health_weight * indicators.health
            + c.volatility_weight * indicators.volatility
            + c.education_weight * (1.0 - indicators.education);
        let level = self.level(score);

        let candidates = [
            (
                indicators.economic > c.economic_driver_above,
                "High economic dependency",
            ),
            (
                indicators.education < c.education_driver_below,
                "Low education stability",
            ),
            (
                indicators.health > c.health_driver_above,
                "High health dependency",
            ),
            (
                indicators.volatility > c.volatility_driver_above,
                "High social volatility",
            ),
        ];
        let mut drivers = candidates
            .into_iter()
            .filter_map(|(fires, name)| fires.then_some(name))
            .collect::<Vec<_>>();
        if drivers.is_empty() {
            drivers.push(NO_MAJOR_DRIVER);
        }

        VulnerabilityProfile {
            indicators: *indicators,
            score,
            level,
            drivers,
            interpretation: level.interpretation(),
        }
    }

    #[must_use]
    pub fn level(&self, score: f64) -> VulnerabilityLevel {
        if score >= self.config.high_level {
            VulnerabilityLevel::High
        } else if score >= self.config.moderate_level {
            VulnerabilityLevel::Moderate
        } else {
            VulnerabilityLevel::Low
        }
    }
}

#[cfg(test)]
mod tests {
    use civicscope_data::{normalize::normalize, table::RawTable};

    use super::*;

    fn scorer() -> VulnerabilityScorer {
        VulnerabilityScorer::new(VulnerabilityConfig::default())
    }

    fn indicators(
        economic: f64,
        education: f64,
        health: f64,
        volatility: f64,
    ) -> VulnerabilityIndicators {
        VulnerabilityIndicators {
            economic,
            education,
            health,
            volatility,
        }
    }

    #[test]
    fn test_economic_driver_only() {
        let profile = scorer().score(&indicators(0.9, 0.9, 0.1, 0.1));
        assert!((profile.score - 0.34).abs() < 1e-9);
        assert_eq!(profile.level, VulnerabilityLevel::Low);
        assert_eq!(profile.drivers, ["High economic dependency"]);
        assert!(profile.has_drivers());
    }

    #[test]
    fn test_all_drivers_and_high_level() {
        let profile = scorer().score(&indicators(0.9, 0.1, 0.9, 0.9));
        // 0.27 + 0.225 + 0.225 + 0.18
        assert!((profile.score - 0.9).abs() < 1e-9);
        assert_eq!(profile.level, VulnerabilityLevel::High);
        assert_eq!(
            profile.drivers,
            [
                "High economic dependency",
                "Low education stability",
                "High health dependency",
                "High social volatility",
            ]
        );
        assert_eq!(
            profile.interpretation,
            "High social vulnerability. Preventive intervention is strongly recommended."
        );
    }

    #[test]
    fn test_no_driver_sentinel() {
        let profile = scorer().score(&indicators(0.5, 0.5, 0.5, 0.5));
        assert_eq!(profile.drivers, [NO_MAJOR_DRIVER]);
        assert!(!profile.has_drivers());
        // 0.15 + 0.125 + 0.125 + 0.1
        assert_eq!(profile.level, VulnerabilityLevel::Moderate);
    }

    #[test]
    fn test_driver_thresholds_are_strict() {
        let profile = scorer().score(&indicators(0.65, 0.45, 0.65, 0.60));
        assert_eq!(profile.drivers, [NO_MAJOR_DRIVER]);
    }

    #[test]
    fn test_level_boundaries_are_inclusive() {
        let scorer = scorer();
        assert_eq!(scorer.level(0.65), VulnerabilityLevel::High);
        assert_eq!(scorer.level(0.45), VulnerabilityLevel::Moderate);
        assert_eq!(scorer.level(0.449), VulnerabilityLevel::Low);
    }

    #[test]
    fn test_out_of_range_inputs_are_scored() {
        let profile = scorer().score(&indicators(2.0, -1.0, 2.0, 2.0));
        assert!(profile.score > 1.0);
        assert!(profile.score.is_finite());
        assert_eq!(profile.level, VulnerabilityLevel::High);
    }

    #[test]
    fn test_custom_weights() {
        let scorer = VulnerabilityScorer::new(VulnerabilityConfig {
            economic_weight: 1.0,
            health_weight: 0.0,
            volatility_weight: 0.0,
            education_weight: 0.0,
            ..VulnerabilityConfig::default()
        });
        let profile = scorer.score(&indicators(0.5, 0.0, 1.0, 1.0));
        assert!((profile.score - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_negative_weight_rejected() {
        let config = VulnerabilityConfig {
            health_weight: -0.25,
            ..VulnerabilityConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidParameter { name: "health_weight", .. })
        ));
    }

    #[test]
    fn test_indicators_from_table() {
        let raw = RawTable::new(
            [
                "District",
                "Economic Dependency",
                "Education Stability",
                "Health Dependency",
                "Volatility",
            ],
            [
                ["Raichur", "0.8", "0.3", "0.7", "0.5"],
                ["Udupi", "0.2", "0.9", "0.3", "0.1"],
            ],
        );
        let table = normalize(&raw, &VulnerabilityIndicators::normalize_spec()).unwrap();
        let raichur = VulnerabilityIndicators::from_record(&table, "RAICHUR")
            .unwrap()
            .unwrap();
        assert_eq!(raichur, indicators(0.8, 0.3, 0.7, 0.5));
        assert!(
            VulnerabilityIndicators::from_record(&table, "KODAGU")
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_profile_json_field_names() {
        let profile = scorer().score(&indicators(0.9, 0.9, 0.1, 0.1));
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["level"], "LOW");
        assert_eq!(json["indicators"]["economic_dependency"], 0.9);
        assert_eq!(json["drivers"][0], "High economic dependency");
    }
}
