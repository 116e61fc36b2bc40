use anyhow::{Context, Result};
use clap::Parser;
use clap_verbosity_flag::Verbosity;
use log::{error, info, warn};
use serde::Serialize;
use solver_results::{
    datastructures::*,
    normalizer::{self, MinKnownTable},
    tree_builder,
};
use std::{fs, path::PathBuf};

#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// Json file written by the result parser
    input_json: PathBuf,
    /// Write relative errors and summaries to this json file
    #[arg(short, long, value_name = "FILE")]
    out: Option<PathBuf>,
    #[command(flatten)]
    verbosity: Verbosity,
}

#[derive(Serialize)]
struct MinKnownRow<'a> {
    group: &'a str,
    instance: &'a str,
    min_known: f64,
}

#[derive(Serialize)]
struct NormalizationReport<'a> {
    min_known: Vec<MinKnownRow<'a>>,
    rel_errors: &'a [RelativeError],
    summaries: &'a [GroupSummary],
    series: &'a [BudgetSeries],
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.verbosity.log_level_filter())
        .init();
    let tree: ResultTree = serde_json::from_str(
        &fs::read_to_string(&args.input_json).with_context(|| {
            format!("Failed to read {}", args.input_json.display())
        })?,
    )?;
    for diagnostic in tree_builder::coverage_diagnostics(&tree) {
        warn!("{diagnostic}");
    }
    let normalization = match normalizer::normalize(&tree) {
        Ok(normalization) => normalization,
        Err(err) => {
            error!("{err:#}");
            std::process::exit(exitcode::DATAERR);
        }
    };
    info!("Minimum values known:");
    for ((group, instance), min) in &normalization.min_known {
        info!("{group:>16} {instance:>16} : {min:.2}");
    }
    let summaries = normalizer::summarize(&normalization.rel_errors)?;
    for summary in &summaries {
        info!("{summary}");
    }
    let series = normalizer::budget_series(&summaries);
    if let Some(out) = &args.out {
        serde_json::to_writer_pretty(
            fs::File::create(out)
                .with_context(|| format!("Failed to create {}", out.display()))?,
            &NormalizationReport {
                min_known: min_known_rows(&normalization.min_known),
                rel_errors: &normalization.rel_errors,
                summaries: &summaries,
                series: &series,
            },
        )?;
        info!("Wrote {}", out.display());
    }
    Ok(())
}

fn min_known_rows(min_known: &MinKnownTable) -> Vec<MinKnownRow<'_>> {
    min_known
        .iter()
        .map(|((group, instance), &min_known)| MinKnownRow {
            group,
            instance,
            min_known,
        })
        .collect()
}
