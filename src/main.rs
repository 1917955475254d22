mod analysis;
mod conditions;
mod report;

use analysis::run_optimization;
use conditions::{build_cantilever_plate, PlateProperties};
use report::render_summary;
use simpx::OptimizationConfig;
use std::error::Error;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // An optional JSON document overrides the default run settings; `--history`
    // appends the per-iteration records as JSON lines.
    let mut config_path = None;
    let mut print_history = false;
    for argument in std::env::args().skip(1) {
        if argument == "--history" {
            print_history = true;
        } else {
            config_path = Some(argument);
        }
    }
    let config = match config_path {
        Some(path) => OptimizationConfig::from_path(path)?,
        None => OptimizationConfig::default(),
    };

    let properties = PlateProperties::default();
    let mut grid = build_cantilever_plate(&properties, &config)?;
    let summary = run_optimization(&mut grid, &config)?;

    println!("{}", render_summary(&summary));
    if print_history {
        println!("{}", summary.result.history_json()?);
    }

    Ok(())
}
