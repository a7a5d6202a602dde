use std::path::PathBuf;

use npscope_analysis::report::preview_segments;

use crate::util::{self, Output};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct PreviewSegmentsArg {
    /// Survey table JSON file
    #[arg(long)]
    survey: PathBuf,
    /// Population table JSON file used to suggest targets
    #[arg(long)]
    population: Option<PathBuf>,
    /// Segment columns, comma separated
    #[arg(long, value_delimiter = ',', required = true)]
    columns: Vec<String>,
    /// Population column summed per segment instead of counting rows
    #[arg(long)]
    target_column: Option<String>,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &PreviewSegmentsArg) -> anyhow::Result<()> {
    let PreviewSegmentsArg {
        survey,
        population,
        columns,
        target_column,
        output,
    } = arg;

    let survey = util::read_table_file("survey", survey)?;
    let population = util::read_optional_table_file("population", population.as_ref())?;

    let preview = preview_segments(
        &survey,
        population.as_ref(),
        columns,
        target_column.as_deref(),
    )?;
    log::info!(
        "Found {} segment(s); {} suggested target(s)",
        preview.segments.len(),
        preview.suggested_targets.len()
    );

    Output::save_report("preview-segments", &preview, output.clone())
}
