use std::path::PathBuf;

use anyhow::Context;
use npscope_analysis::{
    diagnostics::{SegmentWeight, WeightDiagnostics, WeightRisk, segment_weights},
    segment::SegmentKeyBuilder,
    targets::{TargetMap, derive_targets},
    weighting::{CellWeighting, WeightCalculator},
};
use npscope_stats::ratio::round_to;
use serde::Serialize;

use crate::util::{self, Output};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct DiagnoseWeightsArg {
    /// Survey table JSON file
    #[arg(long)]
    survey: PathBuf,
    /// Population table JSON file for deriving targets
    #[arg(long)]
    population: Option<PathBuf>,
    /// Segment columns, comma separated
    #[arg(long, value_delimiter = ',', required = true)]
    columns: Vec<String>,
    /// Targets JSON file mapping segment keys to proportions
    #[arg(long)]
    targets: Option<PathBuf>,
    /// Population column summed per segment instead of counting rows
    #[arg(long)]
    target_column: Option<String>,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
struct WeightDiagnosisReport {
    strategy: &'static str,
    excluded_count: usize,
    unmatched_rows: usize,
    unmatched_segments: Vec<String>,
    diagnostics: Option<WeightDiagnostics>,
    segments: Vec<SegmentWeight>,
}

pub(crate) fn run(arg: &DiagnoseWeightsArg) -> anyhow::Result<()> {
    let DiagnoseWeightsArg {
        survey,
        population,
        columns,
        targets,
        target_column,
        output,
    } = arg;

    let survey = util::read_table_file("survey", survey)?;
    let targets = match targets {
        Some(path) => util::read_json_file::<TargetMap, _>("targets", path)?,
        None => {
            let population = util::read_optional_table_file("population", population.as_ref())?
                .context("Either --targets or --population is required")?;
            derive_targets(&population, columns, target_column.as_deref())
        }
    };
    anyhow::ensure!(!targets.is_empty(), "No targets for segment columns: {}", columns.join(", "));
    log::info!("Using {} segment target(s)", targets.len());

    let indices = survey.require_columns(columns)?;
    let complete = survey.filter_rows(|row| !SegmentKeyBuilder::has_blank(row, &indices));
    let excluded_count = survey.len() - complete.len();
    if excluded_count > 0 {
        log::info!("Excluded {excluded_count} row(s) with missing segment data");
    }

    let weights = WeightCalculator::new(columns.iter().cloned())
        .weights(&complete, &CellWeighting::new(targets))?;
    let diagnostics = WeightDiagnostics::from_weights(&weights.values);
    if let Some(diagnostics) = &diagnostics {
        log::info!(
            "{} weight(s): min {:.3}, max {:.3}, design effect {:.3}, effective sample size {:.1}",
            diagnostics.count,
            diagnostics.min,
            diagnostics.max,
            diagnostics.design_effect,
            diagnostics.effective_sample_size
        );
    }

    let segments = segment_weights(&weights.segment_keys, &weights.values)
        .into_iter()
        .map(|segment| SegmentWeight {
            weight: round_to(segment.weight, 4),
            ..segment
        })
        .collect::<Vec<_>>();
    for segment in segments.iter().filter(|s| s.risk >= WeightRisk::Risk) {
        log::warn!(
            "Segment '{}' ({} row(s)) has weight {} [{}]",
            segment.segment,
            segment.rows,
            segment.weight,
            segment.risk
        );
    }

    let report = WeightDiagnosisReport {
        strategy: weights.strategy,
        excluded_count,
        unmatched_rows: weights.unmatched_rows,
        unmatched_segments: weights.unmatched_segments,
        diagnostics,
        segments,
    };
    Output::save_report("diagnose-weights", &report, output.clone())
}
