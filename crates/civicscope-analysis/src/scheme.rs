//! Built-in scheme dataset presets
//!
//! Each preset describes how one published scheme export is laid out: which
//! column holds the district, which holds the metric, and how aggressive the
//! outlier detector should be for it.
//!
//! | id            | metric                         | label         | contamination | joins population |
//! |---------------|--------------------------------|---------------|---------------|------------------|
//! | `pm-kisan`    | `number_of_beneficiaries`      | Coverage      | 0.35          | yes              |
//! | `mgnrega`     | `total_individuals_worked`     | Participation | 0.30          | no               |
//! | `scholarship` | post-matric SC beneficiaries   | Coverage      | 0.35          | no               |

use civicscope_data::{alias::AliasTable, normalize::NormalizeSpec};
use serde::Serialize;

use crate::{ConfigurationError, outlier::OutlierConfig};

/// Label of the state-level total row present in the exports.
pub const SUMMARY_ROW_LABEL: &str = "TOTAL";

/// Canonical name of the district key column after normalization.
pub const DISTRICT_COLUMN: &str = "district";

/// Canonical name of the population column of census tables.
pub const POPULATION_COLUMN: &str = "population";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SchemePreset {
    pub id: &'static str,
    /// Name shown in reports.
    pub name: &'static str,
    /// Source column holding the district, if not `district`.
    pub district_column: Option<&'static str>,
    pub metric_column: &'static str,
    pub metric_label: &'static str,
    /// Expected fraction of anomalous districts.
    pub contamination: f64,
    /// Whether the metric is divided by population before analysis.
    pub needs_population: bool,
}

const PRESETS: [SchemePreset; 3] = [
    SchemePreset {
        id: "pm-kisan",
        name: "PM-KISAN",
        district_column: None,
        metric_column: "number_of_beneficiaries",
        metric_label: "Coverage",
        contamination: 0.35,
        needs_population: true,
    },
    SchemePreset {
        id: "mgnrega",
        name: "MGNREGA",
        district_column: Some("district_name"),
        metric_column: "total_individuals_worked",
        metric_label: "Participation",
        contamination: 0.30,
        needs_population: false,
    },
    SchemePreset {
        id: "scholarship",
        name: "SCHOLARSHIP",
        district_column: Some("district_name"),
        metric_column: "2022-23_-_post-matric_scholarships_scheme_for_sc_students_-_number_of_beneficiaries",
        metric_label: "Coverage",
        contamination: 0.35,
        needs_population: false,
    },
];

impl SchemePreset {
    /// All built-in presets.
    #[must_use]
    pub fn all() -> &'static [Self] {
        &PRESETS
    }

    /// Looks a preset up by id, case-insensitively.
    ///
    /// # Errors
    ///
    /// * [`ConfigurationError::UnknownScheme`] - no preset has this id
    ///
    /// # Examples
    ///
    /// ```
    /// use civicscope_analysis::scheme::SchemePreset;
    ///
    /// let preset = SchemePreset::from_id("MGNREGA")?;
    /// assert_eq!(preset.metric_label, "Participation");
    /// assert!(SchemePreset::from_id("nrega").is_err());
    /// # Ok::<(), civicscope_analysis::ConfigurationError>(())
    /// ```
    pub fn from_id(id: &str) -> Result<Self, ConfigurationError> {
        PRESETS
            .iter()
            .find(|p| p.id.eq_ignore_ascii_case(id.trim()))
            .copied()
            .ok_or_else(|| ConfigurationError::UnknownScheme {
                id: id.to_owned(),
                known: PRESETS.iter().map(|p| p.id.to_owned()).collect(),
            })
    }

    /// How the scheme table is normalized.
    #[must_use]
    pub fn normalize_spec(&self) -> NormalizeSpec {
        let spec = NormalizeSpec::new(DISTRICT_COLUMN, [self.metric_column])
            .with_aliases(AliasTable::karnataka())
            .with_summary_row(SUMMARY_ROW_LABEL);
        match self.district_column {
            Some(column) => spec.with_rename(column, DISTRICT_COLUMN),
            None => spec,
        }
    }

    /// How the census table joined against this scheme is normalized.
    #[must_use]
    pub fn population_spec(&self) -> NormalizeSpec {
        NormalizeSpec::new(DISTRICT_COLUMN, [POPULATION_COLUMN])
            .with_aliases(AliasTable::karnataka())
            .with_summary_row(SUMMARY_ROW_LABEL)
    }

    /// Name of the pipeline this scheme's metric is meant for.
    #[must_use]
    pub fn pipeline(&self) -> &'static str {
        if self.needs_population {
            "coverage"
        } else {
            "participation"
        }
    }

    /// `base` with this scheme's contamination and metric label.
    #[must_use]
    pub fn outlier_config(&self, base: &OutlierConfig) -> OutlierConfig {
        OutlierConfig {
            contamination: self.contamination,
            metric_label: self.metric_label.to_owned(),
            ..base.clone()
        }
    }
}
