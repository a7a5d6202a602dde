use std::path::PathBuf;

use npscope_analysis::report::{AnalysisRequest, run_analysis};

use crate::util::{self, Output};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct AnalyzeArg {
    /// Survey table JSON file
    #[arg(long)]
    survey: PathBuf,
    /// Population table JSON file for deriving targets and subset weighting
    #[arg(long)]
    population: Option<PathBuf>,
    /// Analysis request JSON file
    #[arg(long)]
    request: PathBuf,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &AnalyzeArg) -> anyhow::Result<()> {
    let AnalyzeArg {
        survey,
        population,
        request,
        output,
    } = arg;

    let survey = util::read_table_file("survey", survey)?;
    let population = util::read_optional_table_file("population", population.as_ref())?;
    let request: AnalysisRequest = util::read_json_file("analysis request", request)?;

    let report = run_analysis(&survey, population.as_ref(), &request)?;
    if report.excluded_count > 0 {
        log::info!(
            "Excluded {} row(s) with missing segment data",
            report.excluded_count
        );
    }
    log::info!(
        "NPS {} over {} response(s) ({})",
        report.nps.score,
        report.nps.responses,
        if report.weighted { "weighted" } else { "unweighted" }
    );

    Output::save_report("analyze", &report, output.clone())
}
