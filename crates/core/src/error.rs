//! Error types for GeoFlow

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for GeoFlow core operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unknown CRS: {0}")]
    UnknownCrs(String),

    #[error("unsupported source format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("no feature table found in {}", .0.display())]
    NoFeatureTable(PathBuf),

    #[error("invalid GeoPackage: {reason}")]
    InvalidGeoPackage { reason: String },

    #[error("unsupported WKB geometry type: {0}")]
    UnsupportedWkbType(u32),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("invalid GeoJSON: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for GeoFlow core operations
pub type Result<T> = std::result::Result<T, Error>;
