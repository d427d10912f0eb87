//! End-to-end scheme analyses
//!
//! A pipeline takes raw scheme (and census) tables, runs them through
//! normalization, the optional population join, ranking and outlier
//! detection, and returns one [`SchemeReport`]. A failure is tagged with the
//! [`Stage`] it happened in; no partial report is returned alongside it.

use civicscope_data::{
    SchemaError,
    join::join_and_derive_ratio,
    normalize::{NormalizedTable, normalize},
    table::RawTable,
};
use serde::Serialize;

use crate::{
    AnalysisError, ConfigurationError,
    config::AnalysisConfig,
    outlier::{LabeledPoint, OutlierDetector, OutlierReport},
    ranking::{MetricSummary, RankedDistrict, rank_lowest},
    scheme::{DISTRICT_COLUMN, POPULATION_COLUMN, SchemePreset},
};

/// Name of the derived metric of coverage reports.
pub const COVERAGE_RATIO: &str = "coverage_ratio";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[display("validating configuration")]
    Configure,
    #[display("normalizing beneficiary table")]
    NormalizeBeneficiaries,
    #[display("normalizing population table")]
    NormalizePopulation,
    #[display("normalizing scheme table")]
    Normalize,
    #[display("joining with population")]
    Join,
    #[display("detecting outliers")]
    Detect,
}

/// A pipeline failure and the stage it happened in.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
#[display("{stage} failed: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    pub source: AnalysisError,
}

impl PipelineError {
    fn new<E>(stage: Stage, error: E) -> Self
    where
        E: Into<AnalysisError>,
    {
        Self {
            stage,
            source: error.into(),
        }
    }
}

/// Result of analysing one scheme.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemeReport {
    pub scheme: &'static str,
    /// Column the districts are ranked and labelled by.
    pub metric: String,
    pub metric_label: &'static str,
    pub total_districts: usize,
    /// `None` when no district survived normalization.
    pub summary: Option<MetricSummary>,
    pub lowest_districts: Vec<RankedDistrict>,
    pub anomaly_count: usize,
    pub outliers: OutlierReport,
    /// Districts dropped because their ratio was undefined (zero population).
    pub excluded_districts: Vec<String>,
}

impl SchemeReport {
    pub fn anomalies(&self) -> impl Iterator<Item = &LabeledPoint> + '_ {
        self.outliers.anomalies()
    }
}

/// Coverage analysis: beneficiaries per capita, ranked and labelled.
///
/// # Errors
///
/// Returns a [`PipelineError`] tagged with the failing stage:
///
/// * [`Stage::Configure`] - `config` does not validate, or `preset` is not a
///   per-capita scheme
/// * [`Stage::NormalizeBeneficiaries`] / [`Stage::NormalizePopulation`] - a
///   table lacks its district or metric column, or has duplicate districts
/// * [`Stage::Join`] - no district appears in both tables
pub fn coverage_pipeline(
    beneficiaries: &RawTable,
    population: &RawTable,
    preset: &SchemePreset,
    config: &AnalysisConfig,
) -> Result<SchemeReport, PipelineError> {
    check_setup(preset, true, config)?;

    let beneficiaries = normalize(beneficiaries, &preset.normalize_spec())
        .map_err(|e| PipelineError::new(Stage::NormalizeBeneficiaries, e))?;
    let population = normalize(population, &preset.population_spec())
        .map_err(|e| PipelineError::new(Stage::NormalizePopulation, e))?;
    let joined = join_and_derive_ratio(
        &beneficiaries,
        &population,
        DISTRICT_COLUMN,
        preset.metric_column,
        POPULATION_COLUMN,
    )
    .map_err(|e| PipelineError::new(Stage::Join, e))?;
    tracing::debug!(
        scheme = preset.name,
        joined = joined.records.len(),
        excluded = joined.excluded.len(),
        "derived coverage ratios"
    );

    analyse(
        preset,
        COVERAGE_RATIO,
        &joined.ratio_points(),
        joined.excluded,
        config,
    )
}

/// Participation analysis on the raw metric of a single scheme table.
///
/// # Errors
///
/// Returns a [`PipelineError`] tagged with the failing stage:
///
/// * [`Stage::Configure`] - `config` does not validate, or `preset` must be
///   divided by population first
/// * [`Stage::Normalize`] - the table lacks its district or metric column, or
///   has duplicate districts
pub fn participation_pipeline(
    raw: &RawTable,
    preset: &SchemePreset,
    config: &AnalysisConfig,
) -> Result<SchemeReport, PipelineError> {
    check_setup(preset, false, config)?;

    let table = normalize(raw, &preset.normalize_spec())
        .map_err(|e| PipelineError::new(Stage::Normalize, e))?;
    let points = metric_points(&table, preset.metric_column)
        .map_err(|e| PipelineError::new(Stage::Normalize, e))?;

    analyse(preset, preset.metric_column, &points, vec![], config)
}

fn check_setup(
    preset: &SchemePreset,
    per_capita: bool,
    config: &AnalysisConfig,
) -> Result<(), PipelineError> {
    config
        .validate()
        .map_err(|e| PipelineError::new(Stage::Configure, e))?;
    if preset.needs_population != per_capita {
        return Err(PipelineError::new(
            Stage::Configure,
            ConfigurationError::WrongPipeline {
                scheme: preset.name,
                expected: preset.pipeline(),
            },
        ));
    }
    Ok(())
}

fn metric_points(table: &NormalizedTable, column: &str) -> Result<Vec<(String, f64)>, SchemaError> {
    table
        .column_points(column)
        .ok_or_else(|| SchemaError::MissingColumn {
            column: column.to_owned(),
            available: table.columns().to_vec(),
        })
}

fn analyse(
    preset: &SchemePreset,
    metric: &str,
    points: &[(String, f64)],
    excluded_districts: Vec<String>,
    config: &AnalysisConfig,
) -> Result<SchemeReport, PipelineError> {
    let detector = OutlierDetector::new(preset.outlier_config(&config.outlier));
    let outliers = detector
        .detect(points)
        .map_err(|e| PipelineError::new(Stage::Detect, e))?;

    Ok(SchemeReport {
        scheme: preset.name,
        metric: metric.to_owned(),
        metric_label: preset.metric_label,
        total_districts: points.len(),
        summary: MetricSummary::from_points(points),
        lowest_districts: rank_lowest(points, config.lowest_count),
        anomaly_count: outliers.anomaly_count(),
        outliers,
        excluded_districts,
    })
}
