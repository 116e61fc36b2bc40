use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use std::fs;

use solver_results::datastructures::*;
use solver_results::tree_builder;

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.verbosity.log_level_filter())
        .init();
    let config = match Config::from_cli(&args) {
        Ok(config) => config,
        Err(err) => {
            error!("{err:#}");
            std::process::exit(exitcode::CONFIG);
        }
    };
    let output = match tree_builder::build(&args.input_folder, &config) {
        Ok(output) => output,
        Err(err) => {
            error!("{err:#}");
            std::process::exit(exitcode::DATAERR);
        }
    };
    if !output.diagnostics.is_empty() {
        info!(
            "{} logs or folders were skipped",
            output.diagnostics.len()
        );
    }
    serde_json::to_writer_pretty(
        fs::File::create(&args.output_json).with_context(|| {
            format!("Failed to create {}", args.output_json.display())
        })?,
        &output.tree,
    )?;
    info!("Wrote {}", args.output_json.display());
    Ok(())
}
