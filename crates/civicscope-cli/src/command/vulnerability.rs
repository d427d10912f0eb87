use std::path::PathBuf;

use anyhow::Context;
use civicscope_analysis::{
    config::AnalysisConfig,
    vulnerability::{VulnerabilityIndicators, VulnerabilityProfile, VulnerabilityScorer},
};
use civicscope_data::{alias::AliasTable, normalize};
use serde::Serialize;

use crate::util::{self, DistrictList, Output};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct VulnerabilityArg {
    /// District indicator table (CSV with `economic_dependency`,
    /// `education_stability`, `health_dependency` and `volatility`)
    dataset: PathBuf,
    /// District to score; lists the available districts when omitted
    #[arg(long)]
    district: Option<String>,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct DistrictVulnerabilityReport<'a> {
    district: &'a str,
    #[serde(flatten)]
    profile: VulnerabilityProfile,
}

pub(crate) fn run(arg: &VulnerabilityArg, config: &AnalysisConfig) -> anyhow::Result<()> {
    let VulnerabilityArg {
        dataset,
        district,
        output,
    } = arg;

    let aliases = AliasTable::karnataka();
    let raw = util::read_csv_file("vulnerability", dataset)?;
    let spec = VulnerabilityIndicators::normalize_spec().with_aliases(aliases.clone());
    let table = normalize::normalize(&raw, &spec)
        .with_context(|| format!("Invalid vulnerability table: {}", dataset.display()))?;

    let Some(district) = district else {
        let mut districts = table.districts().collect::<Vec<_>>();
        districts.sort_unstable();
        return Output::save_json(&DistrictList { districts }, output.clone());
    };

    let canonical = aliases.resolve(district);
    let indicators = VulnerabilityIndicators::from_record(&table, &canonical)?
        .with_context(|| format!("District not found: {district}"))?;
    let profile = VulnerabilityScorer::new(config.vulnerability.clone()).score(&indicators);
    tracing::debug!(
        district = %canonical,
        score = profile.score,
        level = %profile.level,
        "scored district"
    );

    let report = DistrictVulnerabilityReport {
        district: &canonical,
        profile,
    };
    Output::save_json(&report, output.clone())?;
    Ok(())
}
