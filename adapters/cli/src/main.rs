#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Plot Defence session.

mod config;
mod simulation;

use std::{path::PathBuf, time::Duration};

use anyhow::{ensure, Result};
use clap::Parser;
use plot_defence_system_catalog::WaveCatalog;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::{config::SimulationConfig, simulation::Simulation};

/// Flags accepted by the `plot-defence` binary.
#[derive(Debug, Parser)]
#[command(name = "plot-defence", about = "Runs a headless Plot Defence session")]
struct Args {
    /// Wave document in JSON.
    #[arg(long, default_value = "demos/waves.json")]
    waves: PathBuf,
    /// Simulation settings in TOML.
    #[arg(long, default_value = "demos/config.toml")]
    config: PathBuf,
    /// Fixed step in milliseconds.
    #[arg(long, default_value_t = 50)]
    step_ms: u64,
    /// Upper bound on simulated steps.
    #[arg(long, default_value_t = 100_000)]
    max_ticks: u64,
}

fn init_logging() -> Result<()> {
    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(fmt::layer().with_writer(std::io::stderr));
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Entry point for the Plot Defence command-line interface.
fn main() -> Result<()> {
    init_logging()?;
    let args = Args::parse();
    ensure!(args.step_ms > 0, "--step-ms must be positive");

    let config = SimulationConfig::from_path(&args.config)?;
    let catalog = WaveCatalog::load_path(&args.waves);
    info!(
        waves = catalog.wave_count(),
        plots = config.plots.len(),
        "session loaded"
    );

    let summary = Simulation::new(&config, catalog)
        .run(Duration::from_millis(args.step_ms), args.max_ticks);
    println!("{summary}");
    Ok(())
}
