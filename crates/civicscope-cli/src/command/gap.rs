use std::path::PathBuf;

use anyhow::Context;
use civicscope_analysis::{
    config::AnalysisConfig,
    gap::{GapAssessment, GapClassifier, SchemeCoverageTable},
};
use civicscope_data::alias::AliasTable;
use serde::Serialize;

use crate::util::{self, DistrictList, Output};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct GapArg {
    /// Per-district, per-scheme coverage table (CSV with `district`, `scheme`, `coverage_ratio`)
    dataset: PathBuf,
    /// District to classify; lists the available districts when omitted
    #[arg(long)]
    district: Option<String>,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct DistrictGapReport<'a> {
    district: &'a str,
    #[serde(flatten)]
    assessment: GapAssessment,
}

pub(crate) fn run(arg: &GapArg, config: &AnalysisConfig) -> anyhow::Result<()> {
    let GapArg {
        dataset,
        district,
        output,
    } = arg;

    let aliases = AliasTable::karnataka();
    let raw = util::read_csv_file("scheme coverage", dataset)?;
    let table = SchemeCoverageTable::from_raw(&raw, &aliases)
        .with_context(|| format!("Invalid scheme coverage table: {}", dataset.display()))?;

    let Some(district) = district else {
        let list = DistrictList {
            districts: table.districts().collect(),
        };
        return Output::save_json(&list, output.clone());
    };

    let canonical = aliases.resolve(district);
    let schemes = table
        .schemes_for(&canonical, &aliases)
        .with_context(|| format!("District not found: {district}"))?;
    let assessment = GapClassifier::new(config.gap.clone())
        .classify(schemes)
        .with_context(|| format!("No usable coverage ratios for district: {district}"))?;
    tracing::debug!(
        district = %canonical,
        findings = assessment.findings.len(),
        risk = %assessment.risk_level,
        "classified district"
    );

    let report = DistrictGapReport {
        district: &canonical,
        assessment,
    };
    Output::save_json(&report, output.clone())?;
    Ok(())
}
