use std::path::PathBuf;

use anyhow::Context;
use civicscope_analysis::{config::AnalysisConfig, pipeline, scheme::SchemePreset};

use crate::util::{self, Output};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ParticipationArg {
    /// Scheme preset describing the table layout
    #[arg(long)]
    scheme: String,
    /// Scheme table (CSV)
    dataset: PathBuf,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &ParticipationArg, config: &AnalysisConfig) -> anyhow::Result<()> {
    let ParticipationArg {
        scheme,
        dataset,
        output,
    } = arg;

    let preset = SchemePreset::from_id(scheme)?;
    let raw = util::read_csv_file(preset.name, dataset)?;

    let report = pipeline::participation_pipeline(&raw, &preset, config)
        .with_context(|| format!("{} participation analysis failed", preset.name))?;

    Output::save_json(&report, output.clone())?;
    Ok(())
}
