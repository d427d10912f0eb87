//! District welfare analysis: outliers, rankings, gap and vulnerability scoring
//!
//! This crate holds the analytical engines that run over normalized district
//! tables from [`civicscope_data`].
//!
//! # Overview
//!
//! ## Coverage Workflow
//!
//! 1. **Normalize and join** a scheme table with a population table
//!    ([`pipeline::coverage_pipeline`])
//! 2. **Rank** the lowest-coverage districts ([`ranking::rank_lowest`])
//! 3. **Flag anomalies** with a seeded isolation forest ([`outlier::OutlierDetector`])
//!
//! ## Classification Workflow
//!
//! - **Welfare gaps** ([`gap::GapClassifier`]): rule-based findings over the
//!   per-scheme coverage ratios of one district
//! - **Vulnerability** ([`vulnerability::VulnerabilityScorer`]): weighted
//!   composite of four normalized indicators
//!
//! All engines are constructed from an explicit configuration
//! ([`config::AnalysisConfig`]) and are pure functions of their input: nothing
//! is cached between calls, and the outlier model is refit every time.
//!
//! # Examples
//!
//! ```
//! use civicscope_analysis::{
//!     gap::{GapClassifier, GapKind, GapThresholds, RiskLevel},
//!     vulnerability::{VulnerabilityConfig, VulnerabilityIndicators, VulnerabilityScorer},
//! };
//!
//! let classifier = GapClassifier::new(GapThresholds::default());
//! let ratios = [("PM-KISAN".to_owned(), 0.22), ("NSAP".to_owned(), 0.18)];
//! let assessment = classifier.classify(&ratios).unwrap();
//! assert_eq!(assessment.risk_level, RiskLevel::High);
//! assert!(assessment.findings.iter().any(|f| f.kind == GapKind::Awareness));
//!
//! let scorer = VulnerabilityScorer::new(VulnerabilityConfig::default());
//! let profile = scorer.score(&VulnerabilityIndicators {
//!     economic: 0.9,
//!     education: 0.9,
//!     health: 0.1,
//!     volatility: 0.1,
//! });
//! assert_eq!(profile.drivers, ["High economic dependency"]);
//! ```

use civicscope_data::{EmptyJoinError, JoinError, SchemaError};

pub mod config;
pub mod gap;
pub mod outlier;
pub mod pipeline;
pub mod ranking;
pub mod scheme;
pub mod vulnerability;

/// A parameter or identifier supplied by the caller is unusable.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum ConfigurationError {
    #[display("contamination must lie in (0, 0.5), got {value}")]
    ContaminationOutOfRange { value: f64 },
    #[display("ensemble size must be at least 1")]
    ZeroEstimators,
    #[display("parameter '{name}' must be a finite non-negative number, got {value}")]
    InvalidParameter { name: &'static str, value: f64 },
    #[display("value for district '{district}' is not a finite number")]
    NonFiniteValue { district: String },
    #[display("unknown scheme '{id}' (known schemes: {})", known.join(", "))]
    UnknownScheme { id: String, known: Vec<String> },
    #[display("scheme '{scheme}' is analysed by the {expected} pipeline")]
    WrongPipeline {
        scheme: &'static str,
        expected: &'static str,
    },
}

/// Any failure of an analysis stage.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum AnalysisError {
    #[display("{_0}")]
    Schema(SchemaError),
    #[display("{_0}")]
    EmptyJoin(EmptyJoinError),
    #[display("{_0}")]
    Configuration(ConfigurationError),
}

impl From<JoinError> for AnalysisError {
    fn from(error: JoinError) -> Self {
        match error {
            JoinError::Schema(e) => Self::Schema(e),
            JoinError::EmptyJoin(e) => Self::EmptyJoin(e),
        }
    }
}

pub(crate) fn check_parameter(name: &'static str, value: f64) -> Result<(), ConfigurationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidParameter { name, value })
    }
}
