//! District outlier detection
//!
//! Labels each district as NORMAL or ANOMALY from a single metric (usually a
//! coverage ratio or a raw beneficiary count) using a seeded isolation forest
//! from [`civicscope_stats::isolation_forest`].
//!
//! # Labelling
//!
//! The forest gives each district an anomaly score `s` in `(0, 1]`. With
//! contamination `c`, the cut-off is the `100 * c` percentile (linear
//! interpolation) of the negated scores, and a district is an anomaly when its
//! negated score falls strictly below it. Roughly a fraction `c` of the
//! districts is therefore flagged.
//!
//! Anomalies at or below the median metric are reported as `Low <metric>`,
//! the rest as `High <metric>`.
//!
//! # Small samples
//!
//! A forest over a handful of districts is unstable: moving one value can
//! change several labels. Below [`OutlierConfig::min_points`] the report
//! carries an [`InsufficientDataWarning`]; labels are still produced so the
//! caller can decide how to present them.
//!
//! # Examples
//!
//! ```
//! use civicscope_analysis::outlier::detect_outliers;
//!
//! let points = [
//!     ("A".to_owned(), 0.31),
//!     ("B".to_owned(), 0.29),
//!     ("C".to_owned(), 0.33),
//!     ("D".to_owned(), 0.30),
//!     ("E".to_owned(), 0.32),
//!     ("F".to_owned(), 0.02),
//! ];
//! let report = detect_outliers(&points, 0.2, 42)?;
//!
//! // Ordered by ascending metric value
//! assert_eq!(report.points[0].district, "F");
//! assert!(report.points[0].label.status.is_anomaly());
//! assert!(report.warning.is_none());
//! # Ok::<(), civicscope_analysis::ConfigurationError>(())
//! ```

use std::fmt;

use civicscope_stats::{
    descriptive::DescriptiveStats,
    isolation_forest::{IsolationForest, IsolationForestParams},
    percentiles::compute_percentile,
};
use serde::{Deserialize, Serialize};

use crate::ConfigurationError;

/// Parameters of an outlier detection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlierConfig {
    /// Number of isolation trees.
    pub n_estimators: usize,
    /// Upper bound on the subsample each tree is grown on.
    pub max_samples: usize,
    /// Expected fraction of anomalous districts, in `(0, 0.5)`.
    pub contamination: f64,
    /// Seed for the forest's random number generator.
    pub seed: u64,
    /// Inputs smaller than this carry an [`InsufficientDataWarning`].
    pub min_points: usize,
    /// Human-readable name of the metric, used in anomaly reasons.
    pub metric_label: String,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            n_estimators: 300,
            max_samples: 256,
            contamination: 0.35,
            seed: 42,
            min_points: 5,
            metric_label: "Coverage".to_owned(),
        }
    }
}

impl OutlierConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !(self.contamination > 0.0 && self.contamination < 0.5) {
            return Err(ConfigurationError::ContaminationOutOfRange {
                value: self.contamination,
            });
        }
        if self.n_estimators == 0 {
            return Err(ConfigurationError::ZeroEstimators);
        }
        if self.max_samples == 0 {
            return Err(ConfigurationError::InvalidParameter {
                name: "max_samples",
                value: 0.0,
            });
        }
        Ok(())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, derive_more::Display, derive_more::IsVariant,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnomalyStatus {
    #[display("NORMAL")]
    Normal,
    #[display("ANOMALY")]
    Anomaly,
}

/// Outcome for one district plus a short reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnomalyLabel {
    pub status: AnomalyStatus,
    pub reason: String,
}

impl AnomalyLabel {
    fn normal() -> Self {
        Self {
            status: AnomalyStatus::Normal,
            reason: "Within expected range".to_owned(),
        }
    }

    fn anomaly(low: bool, metric_label: &str) -> Self {
        let side = if low { "Low" } else { "High" };
        Self {
            status: AnomalyStatus::Anomaly,
            reason: format!("{side} {metric_label}"),
        }
    }
}

impl fmt::Display for AnomalyLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            AnomalyStatus::Normal => write!(f, "{}", self.status),
            AnomalyStatus::Anomaly => write!(f, "{} ({})", self.status, self.reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledPoint {
    pub district: String,
    pub value: f64,
    /// Isolation forest anomaly score; higher is more isolated.
    pub score: f64,
    pub label: AnomalyLabel,
}

/// Caveat attached to results computed from too few districts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, derive_more::Display)]
#[display(
    "only {points} districts available; outlier labels are statistically unstable below {minimum}"
)]
pub struct InsufficientDataWarning {
    pub points: usize,
    pub minimum: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierReport {
    /// Every input district, ordered by ascending value (ties by name).
    pub points: Vec<LabeledPoint>,
    pub contamination: f64,
    pub n_estimators: usize,
    pub seed: u64,
    pub warning: Option<InsufficientDataWarning>,
}

impl OutlierReport {
    pub fn anomalies(&self) -> impl Iterator<Item = &LabeledPoint> + '_ {
        self.points.iter().filter(|p| p.label.status.is_anomaly())
    }

    #[must_use]
    pub fn anomaly_count(&self) -> usize {
        self.anomalies().count()
    }
}

/// Isolation-forest outlier detector with a fixed configuration.
#[derive(Debug, Clone)]
pub struct OutlierDetector {
    config: OutlierConfig,
}

impl OutlierDetector {
    #[must_use]
    pub fn new(config: OutlierConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &OutlierConfig {
        &self.config
    }

    /// Fits a fresh forest on `points` and labels every district.
    ///
    /// # Errors
    ///
    /// * [`ConfigurationError`] - the configuration is out of range, or a value
    ///   is not finite
    pub fn detect(&self, points: &[(String, f64)]) -> Result<OutlierReport, ConfigurationError> {
        let config = &self.config;
        config.validate()?;
        if let Some((district, _)) = points.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ConfigurationError::NonFiniteValue {
                district: district.clone(),
            });
        }

        let warning = (points.len() < config.min_points).then(|| {
            let warning = InsufficientDataWarning {
                points: points.len(),
                minimum: config.min_points,
            };
            tracing::warn!("{warning}");
            warning
        });

        let values = points.iter().map(|(_, v)| *v).collect::<Vec<_>>();
        let params = IsolationForestParams {
            n_estimators: config.n_estimators,
            max_samples: config.max_samples,
        };
        tracing::debug!(
            points = values.len(),
            n_estimators = params.n_estimators,
            contamination = config.contamination,
            seed = config.seed,
            "fitting isolation forest"
        );
        let scores = IsolationForest::fit(&values, &params, config.seed)
            .map(|forest| forest.scores(&values))
            .unwrap_or_default();

        let mut negated = scores.iter().map(|s| -s).collect::<Vec<_>>();
        negated.sort_by(f64::total_cmp);
        let threshold = compute_percentile(&negated, 100.0 * config.contamination);
        let median = DescriptiveStats::new(values.iter().copied()).map_or(f64::NAN, |s| s.median);

        let mut labeled = points
            .iter()
            .zip(scores)
            .map(|((district, value), score)| {
                let label = if -score < threshold {
                    AnomalyLabel::anomaly(*value <= median, &config.metric_label)
                } else {
                    AnomalyLabel::normal()
                };
                LabeledPoint {
                    district: district.clone(),
                    value: *value,
                    score,
                    label,
                }
            })
            .collect::<Vec<_>>();
        labeled.sort_by(|a, b| {
            a.value
                .total_cmp(&b.value)
                .then_with(|| a.district.cmp(&b.district))
        });

        let report = OutlierReport {
            points: labeled,
            contamination: config.contamination,
            n_estimators: config.n_estimators,
            seed: config.seed,
            warning,
        };
        tracing::debug!(anomalies = report.anomaly_count(), "labelled districts");
        Ok(report)
    }
}

/// Runs the detector with the reference ensemble size and the given
/// contamination and seed.
pub fn detect_outliers(
    points: &[(String, f64)],
    contamination: f64,
    seed: u64,
) -> Result<OutlierReport, ConfigurationError> {
    OutlierDetector::new(OutlierConfig {
        contamination,
        seed,
        ..OutlierConfig::default()
    })
    .detect(points)
}
