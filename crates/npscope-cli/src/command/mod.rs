use clap::{Parser, Subcommand};
use log::LevelFilter;

use self::{
    analyze::AnalyzeArg, diagnose_weights::DiagnoseWeightsArg,
    preview_segments::PreviewSegmentsArg, rate_nps::RateNpsArg,
    response_rates::ResponseRatesArg,
};

mod analyze;
mod diagnose_weights;
mod preview_segments;
mod rate_nps;
mod response_rates;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// Log debug messages (`RUST_LOG` takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,
    /// What to compute
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// List survey segments and suggest targets from a population table
    PreviewSegments(#[clap(flatten)] PreviewSegmentsArg),
    /// Compute overall and per-group NPS and top-box scores
    Analyze(#[clap(flatten)] AnalyzeArg),
    /// Compute open-end response rates and category incidence per NPS segment
    ResponseRates(#[clap(flatten)] ResponseRatesArg),
    /// Compute NPS weighted by population rates
    RateNps(#[clap(flatten)] RateNpsArg),
    /// Compute cell weights and report their distribution
    DiagnoseWeights(#[clap(flatten)] DiagnoseWeightsArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    init_logger(args.verbose);
    match args.mode {
        Mode::PreviewSegments(arg) => preview_segments::run(&arg)?,
        Mode::Analyze(arg) => analyze::run(&arg)?,
        Mode::ResponseRates(arg) => response_rates::run(&arg)?,
        Mode::RateNps(arg) => rate_nps::run(&arg)?,
        Mode::DiagnoseWeights(arg) => diagnose_weights::run(&arg)?,
    }
    Ok(())
}

fn init_logger(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}
