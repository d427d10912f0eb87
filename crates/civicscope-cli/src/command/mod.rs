use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::util;

use self::{
    coverage::CoverageArg, gap::GapArg, participation::ParticipationArg,
    vulnerability::VulnerabilityArg,
};

mod coverage;
mod gap;
mod participation;
mod vulnerability;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// Analysis configuration JSON file (defaults apply to omitted fields)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// What analysis to run
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Beneficiary coverage per capita, with lowest districts and anomalies
    Coverage(#[clap(flatten)] CoverageArg),
    /// Raw participation counts, with lowest districts and anomalies
    Participation(#[clap(flatten)] ParticipationArg),
    /// Welfare-gap findings from per-scheme coverage ratios
    Gap(#[clap(flatten)] GapArg),
    /// Social-vulnerability profile from district indicators
    Vulnerability(#[clap(flatten)] VulnerabilityArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    util::init_logging();
    let config = util::load_config(args.config.as_deref())?;
    match args.mode {
        Mode::Coverage(arg) => coverage::run(&arg, &config)?,
        Mode::Participation(arg) => participation::run(&arg, &config)?,
        Mode::Gap(arg) => gap::run(&arg, &config)?,
        Mode::Vulnerability(arg) => vulnerability::run(&arg, &config)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory as _;

    use super::*;

    #[test]
    fn test_command_definition() {
        CommandArgs::command().debug_assert();
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let args = CommandArgs::try_parse_from([
            "civicscope",
            "participation",
            "--scheme",
            "mgnrega",
            "mgnrega.csv",
            "--config",
            "analysis.json",
        ])
        .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("analysis.json")));
        assert!(matches!(args.mode, Mode::Participation(_)));
    }

    #[test]
    fn test_coverage_needs_both_tables() {
        let result = CommandArgs::try_parse_from([
            "civicscope",
            "coverage",
            "--scheme",
            "pm-kisan",
            "kisan.csv",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_gap_district_is_optional() {
        let args = CommandArgs::try_parse_from(["civicscope", "gap", "schemes.csv"]).unwrap();
        assert!(matches!(args.mode, Mode::Gap(_)));
    }
}
