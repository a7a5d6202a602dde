use std::path::PathBuf;

use npscope_analysis::{
    report::{ResponseRateRequest, run_response_rates},
    session::AnalysisSession,
};

use crate::util::{self, Output};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ResponseRatesArg {
    /// Survey table JSON file
    #[arg(long)]
    survey: PathBuf,
    /// Coding table JSON file, joined to the survey by respondent id
    #[arg(long)]
    coding: Option<PathBuf>,
    /// Population table JSON file for deriving targets
    #[arg(long)]
    population: Option<PathBuf>,
    /// Response-rate request JSON file
    #[arg(long)]
    request: PathBuf,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &ResponseRatesArg) -> anyhow::Result<()> {
    let ResponseRatesArg {
        survey,
        coding,
        population,
        request,
        output,
    } = arg;

    let request: ResponseRateRequest = util::read_json_file("response-rate request", request)?;

    let mut session = AnalysisSession::new().with_id_column(request.id_column.clone());
    session.set_survey(util::read_table_file("survey", survey)?);
    if let Some(coding) = util::read_optional_table_file("coding", coding.as_ref())? {
        session.set_coding(coding);
    }
    if let Some(population) = util::read_optional_table_file("population", population.as_ref())? {
        session.set_population(population);
    }

    let report = run_response_rates(&session, &request)?;
    log::info!(
        "Computed response rates for {} open-end column(s)",
        report.columns.len()
    );

    Output::save_report("response-rates", &report, output.clone())
}
