use std::path::PathBuf;

use anyhow::Context;
use civicscope_analysis::{config::AnalysisConfig, pipeline, scheme::SchemePreset};

use crate::util::{self, Output};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct CoverageArg {
    /// Scheme preset describing the beneficiary table layout
    #[arg(long, default_value = "pm-kisan")]
    scheme: String,
    /// Scheme beneficiary table (CSV)
    beneficiaries: PathBuf,
    /// District population table (CSV)
    population: PathBuf,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &CoverageArg, config: &AnalysisConfig) -> anyhow::Result<()> {
    let CoverageArg {
        scheme,
        beneficiaries,
        population,
        output,
    } = arg;

    let preset = SchemePreset::from_id(scheme)?;
    let beneficiaries = util::read_csv_file("beneficiary", beneficiaries)?;
    let population = util::read_csv_file("population", population)?;

    let report = pipeline::coverage_pipeline(&beneficiaries, &population, &preset, config)
        .with_context(|| format!("{} coverage analysis failed", preset.name))?;

    Output::save_json(&report, output.clone())?;
    Ok(())
}
