//! GeoFlow CLI - batch vector layer processing

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use geoflow_core::Crs;
use geoflow_pipeline::layer::{run_all, PipelineParams};

mod config;

use config::RunConfig;

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "geoflow")]
#[command(author, version, about = "Batch vector layer processing", long_about = None)]
struct Cli {
    /// Run configuration file
    #[arg(short, long, default_value = "geoflow.toml")]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

// ─── Helpers ────────────────────────────────────────────────────────────

/// Install a subscriber writing to stdout and to a per-run log file.
fn setup_logging(verbose: bool, log_dir: &std::path::Path) -> Result<PathBuf> {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let log_path = log_dir.join(format!("process_{timestamp}.log"));
    let log_file = File::create(&log_path)
        .with_context(|| format!("Failed to create log file {}", log_path.display()))?;

    tracing_subscriber::registry()
        .with(level)
        .with(fmt::layer().with_target(false))
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Arc::new(log_file)),
        )
        .init();
    Ok(log_path)
}

fn run(cli: &Cli) -> Result<bool> {
    let config = RunConfig::load(&cli.config)?;
    config.ensure_directories()?;
    let log_path = setup_logging(cli.verbose, &config.log_dir)?;

    let target_crs = Crs::parse(&config.target_crs)
        .with_context(|| format!("Invalid target CRS {:?}", config.target_crs))?;
    let params = PipelineParams {
        target_crs,
        tolerance: config.simplify_tolerance,
        simplify_method: config::parse_simplify_method(&config.simplify_method)?,
        precision: config.precision,
        keep_attributes: config.attributes_to_keep.clone(),
        backup_dir: config.backup_dir.clone(),
    };

    let jobs = config.jobs();
    info!("starting run: {} layers, log at {}", jobs.len(), log_path.display());

    let summary = run_all(&jobs, &params);
    Ok(summary.all_succeeded())
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
