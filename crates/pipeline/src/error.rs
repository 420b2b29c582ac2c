//! Error taxonomy for the layer pipeline
//!
//! Every variant is caught at the per-job boundary: a failed job never
//! aborts the remaining jobs in a run.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while processing one layer job
#[derive(Error, Debug)]
pub enum Error {
    #[error("source file not found: {}", .0.display())]
    MissingSource(PathBuf),

    #[error("projection {from} -> {to} failed: {reason}")]
    Projection {
        from: String,
        to: String,
        reason: String,
    },

    #[error("failed to serialize {}: {reason}", .path.display())]
    Serialization { path: PathBuf, reason: String },

    #[error(transparent)]
    Core(#[from] geoflow_core::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;
