use std::path::PathBuf;

use npscope_analysis::report::rate_weighted_nps;

use crate::util::{self, Output};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct RateNpsArg {
    /// Survey table JSON file
    #[arg(long)]
    survey: PathBuf,
    /// Population table JSON file carrying the rate column
    #[arg(long)]
    population: PathBuf,
    /// Segment columns, comma separated
    #[arg(long, value_delimiter = ',', required = true)]
    columns: Vec<String>,
    /// Population column summed per segment
    #[arg(long)]
    rate_column: String,
    /// Survey column holding 0-10 scores
    #[arg(long)]
    score_column: String,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &RateNpsArg) -> anyhow::Result<()> {
    let RateNpsArg {
        survey,
        population,
        columns,
        rate_column,
        score_column,
        output,
    } = arg;

    let survey = util::read_table_file("survey", survey)?;
    let population = util::read_table_file("population", population)?;

    let report = rate_weighted_nps(&survey, &population, columns, rate_column, score_column)?;
    if report.unmatched_rows > 0 {
        log::warn!(
            "{} response(s) in segments absent from the population kept weight 1.0: {}",
            report.unmatched_rows,
            report.unmatched_segments.join(", ")
        );
    }
    log::info!(
        "NPS {} over {} valid response(s), scale factor {}",
        report.nps.score,
        report.total_responses,
        report.scale_factor
    );

    Output::save_report("rate-nps", &report, output.clone())
}
