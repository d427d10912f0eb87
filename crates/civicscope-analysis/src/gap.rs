//! Welfare-gap classification
//!
//! Explains *why* a district's scheme uptake looks weak, from the coverage
//! ratios of all schemes in that district.
//!
//! # Summary Statistics
//!
//! - `mean`: average coverage ratio across schemes
//! - `std_dev`: population standard deviation across schemes
//! - `zero_like`: number of schemes below [`GapThresholds::zero_threshold`]
//!
//! # Rules
//!
//! Every rule is evaluated; a district may carry several findings.
//!
//! | Gap                      | Fires when                                       |
//! |--------------------------|--------------------------------------------------|
//! | Awareness Gap            | `mean < low_mean && std_dev < high_variance`     |
//! | Access Gap               | `std_dev >= high_variance && zero_like >= access_zero_count` |
//! | Trust Gap                | `mean < low_mean && std_dev < trust_variance`    |
//! | Data / Reporting Gap     | `zero_like >= data_zero_count`                   |
//! | Migration / Mobility Gap | `std_dev > migration_variance`                   |
//!
//! The Trust Gap band is a strict subset of the Awareness Gap band, so a
//! district with uniformly low coverage carries both findings.
//!
//! Risk is graded from the mean alone: below `high_risk_below` is HIGH, below
//! `medium_risk_below` is MEDIUM, anything else LOW.

use std::collections::BTreeMap;

use civicscope_data::{
    SchemaError,
    alias::AliasTable,
    normalize::{canonical_column_name, parse_numeric},
    table::RawTable,
};
use civicscope_stats::descriptive::DescriptiveStats;
use serde::{Deserialize, Serialize};

use crate::{ConfigurationError, check_parameter};

/// Thresholds of the gap rules and risk grading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GapThresholds {
    /// Mean coverage below which uptake counts as low.
    pub low_mean: f64,
    /// Spread at or above which coverage counts as uneven.
    pub high_variance: f64,
    /// Spread below which low coverage counts as uniform distrust.
    pub trust_variance: f64,
    /// Spread above which variation suggests population mobility.
    pub migration_variance: f64,
    /// Coverage ratio below which a scheme counts as near-zero.
    pub zero_threshold: f64,
    /// Near-zero schemes needed (with high spread) for an access gap.
    pub access_zero_count: usize,
    /// Near-zero schemes needed for a data/reporting gap.
    pub data_zero_count: usize,
    /// Mean coverage below which risk is HIGH.
    pub high_risk_below: f64,
    /// Mean coverage below which risk is MEDIUM.
    pub medium_risk_below: f64,
}

impl Default for GapThresholds {
    fn default() -> Self {
        Self {
            low_mean: 0.4,
            high_variance: 0.08,
            trust_variance: 0.05,
            migration_variance: 0.12,
            zero_threshold: 0.05,
            access_zero_count: 1,
            data_zero_count: 2,
            high_risk_below: 0.3,
            medium_risk_below: 0.6,
        }
    }
}

impl GapThresholds {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        check_parameter("low_mean", self.low_mean)?;
        check_parameter("high_variance", self.high_variance)?;
        check_parameter("trust_variance", self.trust_variance)?;
        check_parameter("migration_variance", self.migration_variance)?;
        check_parameter("zero_threshold", self.zero_threshold)?;
        check_parameter("high_risk_below", self.high_risk_below)?;
        check_parameter("medium_risk_below", self.medium_risk_below)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, derive_more::Display)]
pub enum GapKind {
    #[display("Awareness Gap")]
    #[serde(rename = "Awareness Gap")]
    Awareness,
    #[display("Access Gap")]
    #[serde(rename = "Access Gap")]
    Access,
    #[display("Trust Gap")]
    #[serde(rename = "Trust Gap")]
    Trust,
    #[display("Data / Reporting Gap")]
    #[serde(rename = "Data / Reporting Gap")]
    DataReporting,
    #[display("Migration / Mobility Gap")]
    #[serde(rename = "Migration / Mobility Gap")]
    MigrationMobility,
}

impl GapKind {
    #[must_use]
    pub const fn explanation(self) -> &'static str {
        match self {
            Self::Awareness => "Consistently low scheme usage across multiple schemes",
            Self::Access => "Some schemes have very low uptake while others perform better",
            Self::Trust => "Low participation despite potential eligibility",
            Self::DataReporting => "Multiple schemes report near-zero values",
            Self::MigrationMobility => {
                "Large variation across schemes suggests population mobility"
            }
        }
    }

    #[must_use]
    pub const fn action(self) -> &'static str {
        match self {
            Self::Awareness => "Conduct local awareness and outreach campaigns",
            Self::Access => "Improve application access and facilitation",
            Self::Trust => "Community trust-building initiatives",
            Self::DataReporting => "Audit data collection and reporting systems",
            Self::MigrationMobility => "Design portable and migrant-friendly welfare delivery",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GapFinding {
    #[serde(rename = "type")]
    pub kind: GapKind,
    pub explanation: &'static str,
    pub action: &'static str,
}

impl From<GapKind> for GapFinding {
    fn from(kind: GapKind) -> Self {
        Self {
            kind,
            explanation: kind.explanation(),
            action: kind.action(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, derive_more::Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    #[display("HIGH")]
    High,
    #[display("MEDIUM")]
    Medium,
    #[display("LOW")]
    Low,
}

/// Aggregate coverage statistics of one district.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoverageSummary {
    pub mean: f64,
    pub std_dev: f64,
    pub zero_like: usize,
}

impl CoverageSummary {
    /// Summarizes finite ratios; `None` if there are none.
    #[must_use]
    pub fn from_ratios<I>(ratios: I, zero_threshold: f64) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let ratios = ratios
            .into_iter()
            .filter(|r| r.is_finite())
            .collect::<Vec<_>>();
        let stats = DescriptiveStats::new(ratios.iter().copied())?;
        Some(Self {
            mean: stats.mean,
            std_dev: stats.std_dev,
            zero_like: ratios.iter().filter(|&&r| r < zero_threshold).count(),
        })
    }
}

type GapRule = fn(&CoverageSummary, &GapThresholds) -> bool;

/// Rules in reporting order.
const GAP_RULES: [(GapKind, GapRule); 5] = [
    (GapKind::Awareness, awareness_gap),
    (GapKind::Access, access_gap),
    (GapKind::Trust, trust_gap),
    (GapKind::DataReporting, data_gap),
    (GapKind::MigrationMobility, migration_gap),
];

fn awareness_gap(s: &CoverageSummary, t: &GapThresholds) -> bool {
    s.mean < t.low_mean && s.std_dev < t.high_variance
}

fn access_gap(s: &CoverageSummary, t: &GapThresholds) -> bool {
    s.std_dev >= t.high_variance && s.zero_like >= t.access_zero_count
}

fn trust_gap(s: &CoverageSummary, t: &GapThresholds) -> bool {
    s.mean < t.low_mean && s.std_dev < t.trust_variance
}

fn data_gap(s: &CoverageSummary, t: &GapThresholds) -> bool {
    s.zero_like >= t.data_zero_count
}

fn migration_gap(s: &CoverageSummary, t: &GapThresholds) -> bool {
    s.std_dev > t.migration_variance
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemeCoverage {
    pub scheme: String,
    pub coverage_ratio: f64,
}

/// Findings and risk for one district.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GapAssessment {
    pub summary: CoverageSummary,
    pub risk_level: RiskLevel,
    /// Empty when no rule fires ("no major gap detected").
    pub findings: Vec<GapFinding>,
    pub schemes: Vec<SchemeCoverage>,
}

impl GapAssessment {
    #[must_use]
    pub fn has_gaps(&self) -> bool {
        !self.findings.is_empty()
    }
}

/// Rule-based welfare-gap classifier.
#[derive(Debug, Clone)]
pub struct GapClassifier {
    thresholds: GapThresholds,
}

impl GapClassifier {
    #[must_use]
    pub fn new(thresholds: GapThresholds) -> Self {
        Self { thresholds }
    }

    #[must_use]
    pub fn thresholds(&self) -> &GapThresholds {
        &self.thresholds
    }

    /// Classifies a district from its `(scheme, coverage_ratio)` pairs.
    ///
    /// Non-finite ratios are ignored. Returns `None` if no ratio remains.
    #[must_use]
    pub fn classify(&self, per_scheme: &[(String, f64)]) -> Option<GapAssessment> {
        let summary = CoverageSummary::from_ratios(
            per_scheme.iter().map(|(_, r)| *r),
            self.thresholds.zero_threshold,
        )?;
        Some(GapAssessment {
            summary,
            risk_level: self.risk_level(summary.mean),
            findings: self.classify_summary(&summary),
            schemes: per_scheme
                .iter()
                .map(|(scheme, ratio)| SchemeCoverage {
                    scheme: scheme.clone(),
                    coverage_ratio: *ratio,
                })
                .collect(),
        })
    }

    /// Applies every rule to `summary`, deduplicated by kind in rule order.
    ///
    /// # Examples
    ///
    /// ```
    /// use civicscope_analysis::gap::{CoverageSummary, GapClassifier, GapKind, GapThresholds};
    ///
    /// let classifier = GapClassifier::new(GapThresholds::default());
    /// let summary = CoverageSummary { mean: 0.2, std_dev: 0.03, zero_like: 0 };
    /// let kinds = classifier
    ///     .classify_summary(&summary)
    ///     .into_iter()
    ///     .map(|f| f.kind)
    ///     .collect::<Vec<_>>();
    /// assert_eq!(kinds, [GapKind::Awareness, GapKind::Trust]);
    /// ```
    #[must_use]
    pub fn classify_summary(&self, summary: &CoverageSummary) -> Vec<GapFinding> {
        let mut findings: Vec<GapFinding> = vec![];
        for (kind, rule) in GAP_RULES {
            if rule(summary, &self.thresholds) && findings.iter().all(|f| f.kind != kind) {
                findings.push(kind.into());
            }
        }
        findings
    }

    #[must_use]
    pub fn risk_level(&self, mean: f64) -> RiskLevel {
        if mean < self.thresholds.high_risk_below {
            RiskLevel::High
        } else if mean < self.thresholds.medium_risk_below {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

/// Per-district scheme coverage ratios from a long-format table.
///
/// The source has one row per `(district, scheme)` with columns `district`,
/// `scheme` and `coverage_ratio`. District names are canonicalized and
/// alias-resolved like normalized tables; rows without a scheme or with a
/// malformed ratio are dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemeCoverageTable {
    districts: BTreeMap<String, Vec<(String, f64)>>,
}

impl SchemeCoverageTable {
    pub const DISTRICT_COLUMN: &str = "district";
    pub const SCHEME_COLUMN: &str = "scheme";
    pub const RATIO_COLUMN: &str = "coverage_ratio";

    /// # Errors
    ///
    /// * [`SchemaError::MissingColumn`] - a required column is absent
    /// * [`SchemaError::DuplicateKey`] - a scheme is listed twice for a district
    pub fn from_raw(raw: &RawTable, aliases: &AliasTable) -> Result<Self, SchemaError> {
        let headers = raw
            .headers
            .iter()
            .map(|h| canonical_column_name(h))
            .collect::<Vec<_>>();
        let find_column = |column: &str| {
            headers
                .iter()
                .position(|h| h == column)
                .ok_or_else(|| SchemaError::MissingColumn {
                    column: column.to_owned(),
                    available: headers.clone(),
                })
        };
        let district_index = find_column(Self::DISTRICT_COLUMN)?;
        let scheme_index = find_column(Self::SCHEME_COLUMN)?;
        let ratio_index = find_column(Self::RATIO_COLUMN)?;

        let mut districts = BTreeMap::<String, Vec<(String, f64)>>::new();
        for row in &raw.rows {
            let cell = |index: usize| row.get(index).map_or("", |c| c.trim());
            let district = aliases.resolve(cell(district_index));
            let scheme = cell(scheme_index);
            let Some(ratio) = parse_numeric(cell(ratio_index)) else {
                tracing::debug!(%district, scheme, "dropping scheme row with malformed ratio");
                continue;
            };
            if district.is_empty() || scheme.is_empty() {
                continue;
            }
            let schemes = districts.entry(district.clone()).or_default();
            if schemes.iter().any(|(s, _)| s == scheme) {
                return Err(SchemaError::DuplicateKey {
                    district: format!("{district} / {scheme}"),
                });
            }
            schemes.push((scheme.to_owned(), ratio));
        }
        Ok(Self { districts })
    }

    /// District names in sorted order.
    pub fn districts(&self) -> impl Iterator<Item = &str> + '_ {
        self.districts.keys().map(String::as_str)
    }

    /// Schemes of `district` (canonicalized and alias-resolved first).
    #[must_use]
    pub fn schemes_for(&self, district: &str, aliases: &AliasTable) -> Option<&[(String, f64)]> {
        self.districts
            .get(&aliases.resolve(district))
            .map(Vec::as_slice)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.districts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.districts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> GapClassifier {
        GapClassifier::new(GapThresholds::default())
    }

    fn kinds(summary: CoverageSummary) -> Vec<GapKind> {
        classifier()
            .classify_summary(&summary)
            .into_iter()
            .map(|f| f.kind)
            .collect()
    }

    fn ratios(values: &[f64]) -> Vec<(String, f64)> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| (format!("S{i}"), *v))
            .collect()
    }

    mod rules {
        use super::*;

        #[test]
        fn test_uniformly_low_fires_awareness_and_trust() {
            let summary = CoverageSummary {
                mean: 0.2,
                std_dev: 0.03,
                zero_like: 0,
            };
            assert_eq!(kinds(summary), [GapKind::Awareness, GapKind::Trust]);
        }

        #[test]
        fn test_near_zero_schemes_add_data_gap() {
            let summary = CoverageSummary {
                mean: 0.2,
                std_dev: 0.03,
                zero_like: 2,
            };
            assert_eq!(
                kinds(summary),
                [GapKind::Awareness, GapKind::Trust, GapKind::DataReporting]
            );
        }

        #[test]
        fn test_high_uniform_coverage_fires_nothing() {
            let summary = CoverageSummary {
                mean: 0.8,
                std_dev: 0.02,
                zero_like: 0,
            };
            assert!(kinds(summary).is_empty());
            assert_eq!(classifier().risk_level(summary.mean), RiskLevel::Low);
        }

        #[test]
        fn test_awareness_without_trust() {
            let summary = CoverageSummary {
                mean: 0.3,
                std_dev: 0.06,
                zero_like: 0,
            };
            assert_eq!(kinds(summary), [GapKind::Awareness]);
        }

        #[test]
        fn test_uneven_with_zero_fires_access_and_migration() {
            let summary = CoverageSummary {
                mean: 0.5,
                std_dev: 0.15,
                zero_like: 1,
            };
            assert_eq!(
                kinds(summary),
                [GapKind::Access, GapKind::MigrationMobility]
            );
        }

        #[test]
        fn test_access_boundary_is_inclusive() {
            let summary = CoverageSummary {
                mean: 0.5,
                std_dev: 0.08,
                zero_like: 1,
            };
            assert_eq!(kinds(summary), [GapKind::Access]);
        }

        #[test]
        fn test_migration_boundary_is_exclusive() {
            let summary = CoverageSummary {
                mean: 0.7,
                std_dev: 0.12,
                zero_like: 0,
            };
            assert!(kinds(summary).is_empty());
        }

        #[test]
        fn test_thresholds_are_configurable() {
            let classifier = GapClassifier::new(GapThresholds {
                low_mean: 0.9,
                ..GapThresholds::default()
            });
            let summary = CoverageSummary {
                mean: 0.8,
                std_dev: 0.02,
                zero_like: 0,
            };
            let kinds = classifier
                .classify_summary(&summary)
                .into_iter()
                .map(|f| f.kind)
                .collect::<Vec<_>>();
            assert_eq!(kinds, [GapKind::Awareness, GapKind::Trust]);
        }
    }

    #[test]
    fn test_risk_levels() {
        let classifier = classifier();
        assert_eq!(classifier.risk_level(0.29), RiskLevel::High);
        assert_eq!(classifier.risk_level(0.3), RiskLevel::Medium);
        assert_eq!(classifier.risk_level(0.5), RiskLevel::Medium);
        assert_eq!(classifier.risk_level(0.6), RiskLevel::Low);
    }

    #[test]
    fn test_classify_uses_population_std_dev() {
        // Population std of [0.1, 0.3] is 0.1 (sample std would be ~0.141)
        let assessment = classifier().classify(&ratios(&[0.1, 0.3])).unwrap();
        assert!((assessment.summary.std_dev - 0.1).abs() < 1e-12);
        assert!(!assessment.has_gaps());
        assert_eq!(assessment.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_classify_counts_zero_like() {
        let assessment = classifier()
            .classify(&ratios(&[0.01, 0.0, 0.6, 0.7]))
            .unwrap();
        assert_eq!(assessment.summary.zero_like, 2);
        assert!(
            assessment
                .findings
                .iter()
                .any(|f| f.kind == GapKind::DataReporting)
        );
        assert_eq!(assessment.schemes.len(), 4);
    }

    #[test]
    fn test_classify_empty_is_none() {
        assert!(classifier().classify(&[]).is_none());
    }

    #[test]
    fn test_finding_text() {
        let finding = GapFinding::from(GapKind::Trust);
        assert_eq!(finding.kind.to_string(), "Trust Gap");
        assert_eq!(finding.action, "Community trust-building initiatives");
        let json = serde_json::to_value(&finding).unwrap();
        assert_eq!(json["type"], "Trust Gap");
    }

    #[test]
    fn test_invalid_threshold() {
        let thresholds = GapThresholds {
            zero_threshold: -0.1,
            ..GapThresholds::default()
        };
        assert_eq!(
            thresholds.validate().unwrap_err(),
            ConfigurationError::InvalidParameter {
                name: "zero_threshold",
                value: -0.1
            }
        );
    }

    mod table {
        use super::*;

        fn raw() -> RawTable {
            RawTable::new(
                ["District", "Scheme", "Coverage Ratio"],
                [
                    ["Mysore", "PM-KISAN", "0.42"],
                    ["Mysuru", "MGNREGA", "0.38"],
                    ["Udupi", "PM-KISAN", "0.71"],
                    ["Udupi", "MGNREGA", "-"],
                ],
            )
        }

        #[test]
        fn test_groups_by_canonical_district() {
            let aliases = AliasTable::karnataka();
            let table = SchemeCoverageTable::from_raw(&raw(), &aliases).unwrap();
            assert_eq!(table.districts().collect::<Vec<_>>(), ["MYSURU", "UDUPI"]);
            let schemes = table.schemes_for("mysore", &aliases).unwrap();
            assert_eq!(schemes.len(), 2);
            assert_eq!(table.schemes_for("udupi", &aliases).unwrap().len(), 1);
            assert!(table.schemes_for("Kodagu", &aliases).is_none());
        }

        #[test]
        fn test_duplicate_scheme() {
            let raw = RawTable::new(
                ["district", "scheme", "coverage_ratio"],
                [["A", "X", "0.1"], ["a", "X", "0.2"]],
            );
            let err = SchemeCoverageTable::from_raw(&raw, &AliasTable::new()).unwrap_err();
            assert!(matches!(err, SchemaError::DuplicateKey { .. }));
        }

        #[test]
        fn test_missing_ratio_column() {
            let raw = RawTable::new(["district", "scheme"], [["A", "X"]]);
            let err = SchemeCoverageTable::from_raw(&raw, &AliasTable::new()).unwrap_err();
            assert!(
                matches!(err, SchemaError::MissingColumn { column, .. } if column == "coverage_ratio")
            );
        }
    }
}
