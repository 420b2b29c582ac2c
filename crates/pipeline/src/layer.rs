//! Per-layer pipeline orchestration
//!
//! One layer job runs through a fixed stage sequence; any stage error is
//! caught at the job boundary, logged with its stage, and marks the job
//! failed without aborting the remaining jobs. Jobs run sequentially in the
//! order supplied (the backup directory is shared, so reordering is not
//! assumed safe).

use std::fmt;
use std::fs;
use std::path::PathBuf;
use tracing::{error, info};

use geoflow_core::crs::Crs;
use geoflow_core::io;

use crate::attributes::{self, CleanParams};
use crate::backup;
use crate::error::Error;
use crate::repair;
use crate::reproject;
use crate::rounding;
use crate::simplify::{self, SimplifyMethod, SimplifyParams};

/// One layer conversion job, supplied by the configuration layer.
#[derive(Debug, Clone)]
pub struct LayerJob {
    pub name: String,
    pub source: PathBuf,
    pub output: PathBuf,
    pub description: String,
}

/// Parameters shared by every job in a run.
#[derive(Debug, Clone)]
pub struct PipelineParams {
    pub target_crs: Crs,
    /// Simplification tolerance, in target-CRS units
    pub tolerance: f64,
    pub simplify_method: SimplifyMethod,
    /// Decimal places kept on output coordinates
    pub precision: u32,
    /// Attribute allow-list; empty keeps everything
    pub keep_attributes: Vec<String>,
    pub backup_dir: PathBuf,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            target_crs: Crs::wgs84(),
            tolerance: 1e-5,
            simplify_method: SimplifyMethod::default(),
            precision: rounding::DEFAULT_PRECISION,
            keep_attributes: Vec::new(),
            backup_dir: PathBuf::from("backup"),
        }
    }
}

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    SourceCheck,
    Backup,
    Load,
    Repair,
    Reproject,
    Simplify,
    Clean,
    Export,
    Round,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::SourceCheck => "source check",
            Stage::Backup => "backup",
            Stage::Load => "load",
            Stage::Repair => "repair",
            Stage::Reproject => "reprojection",
            Stage::Simplify => "simplification",
            Stage::Clean => "attribute cleaning",
            Stage::Export => "export",
            Stage::Round => "coordinate rounding",
        };
        write!(f, "{name}")
    }
}

/// Outcome of one run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunSummary {
    pub succeeded: usize,
    pub total: usize,
}

impl RunSummary {
    pub fn all_succeeded(&self) -> bool {
        self.succeeded == self.total
    }
}

/// Process every job sequentially and report the tally.
pub fn run_all(jobs: &[LayerJob], params: &PipelineParams) -> RunSummary {
    let mut summary = RunSummary {
        succeeded: 0,
        total: jobs.len(),
    };
    for job in jobs {
        info!("==== processing layer: {} ({}) ====", job.name, job.description);
        match run_layer(job, params) {
            Ok(()) => {
                summary.succeeded += 1;
                info!("{} processed successfully", job.name);
            }
            Err((stage, err)) => {
                error!("{} failed during {stage}: {err}", job.name);
            }
        }
    }
    info!("{}/{} layers succeeded", summary.succeeded, summary.total);
    summary
}

fn stage_err<E: Into<Error>>(stage: Stage) -> impl FnOnce(E) -> (Stage, Error) {
    move |err| (stage, err.into())
}

/// Run one job through the whole stage sequence.
pub fn run_layer(job: &LayerJob, params: &PipelineParams) -> Result<(), (Stage, Error)> {
    if !job.source.exists() {
        return Err((
            Stage::SourceCheck,
            Error::MissingSource(job.source.clone()),
        ));
    }
    info!("source file: {}", job.source.display());

    backup::backup_existing(&job.output, &params.backup_dir)
        .map_err(stage_err(Stage::Backup))?;

    info!("loading features...");
    let mut collection = io::read_vector(&job.source).map_err(stage_err(Stage::Load))?;
    info!(
        "{} features loaded (source CRS {})",
        collection.len(),
        collection.crs
    );

    let repair_report = repair::repair_collection(&mut collection);
    if repair_report.invalid == 0 {
        info!("all geometries valid");
    }

    if collection.crs != params.target_crs {
        info!("reprojecting to {}...", params.target_crs);
    }
    reproject::reproject_collection(&mut collection, params.target_crs)
        .map_err(stage_err(Stage::Reproject))?;

    info!("simplifying (tolerance: {})...", params.tolerance);
    let simplify_report = simplify::simplify_collection(
        &mut collection,
        &SimplifyParams {
            tolerance: params.tolerance,
            method: params.simplify_method,
        },
    );
    info!(
        "{:.1}% reduction ({} → {})",
        simplify_report.reduction_pct(),
        simplify_report.before,
        simplify_report.after
    );

    info!("cleaning attributes...");
    let kept = attributes::clean_collection(
        &mut collection,
        &CleanParams {
            keep: params.keep_attributes.clone(),
        },
    );
    info!("{kept} attributes retained");

    info!("exporting GeoJSON...");
    io::write_geojson(&collection, &job.output).map_err(|e| {
        (
            Stage::Export,
            Error::Serialization {
                path: job.output.clone(),
                reason: e.to_string(),
            },
        )
    })?;

    rounding::round_file(&job.output, params.precision).map_err(stage_err(Stage::Round))?;

    if let Ok(metadata) = fs::metadata(&job.output) {
        info!(
            "export complete: {} ({:.2} KiB)",
            job.output.display(),
            metadata.len() as f64 / 1024.0
        );
    }
    Ok(())
}
