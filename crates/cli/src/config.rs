//! Run configuration loaded from a TOML file
//!
//! One file describes a whole run: directory layout, processing parameters,
//! and the list of layers to process. Everything except the layer list has
//! a default, so a minimal file only names its layers.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use geoflow_pipeline::layer::LayerJob;
use geoflow_pipeline::simplify::SimplifyMethod;

/// Top-level run configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    #[serde(default = "default_target_crs")]
    pub target_crs: String,
    /// Simplification tolerance. For `visvalingam` (the default method)
    /// this is an effective area in squared target-CRS units; for
    /// `douglas-peucker` it is a distance in target-CRS units.
    #[serde(default = "default_tolerance")]
    pub simplify_tolerance: f64,
    /// Simplification method: `visvalingam` (topology preserving) or
    /// `douglas-peucker`.
    #[serde(default = "default_simplify_method")]
    pub simplify_method: String,
    #[serde(default = "default_precision")]
    pub precision: u32,
    /// Attribute allow-list; empty keeps every attribute.
    #[serde(default)]
    pub attributes_to_keep: Vec<String>,

    #[serde(default = "default_raw_dir")]
    pub raw_data_dir: PathBuf,
    #[serde(default = "default_processed_dir")]
    pub processed_data_dir: PathBuf,
    #[serde(default = "default_backup_dir")]
    pub backup_dir: PathBuf,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    #[serde(default)]
    pub layers: Vec<LayerConfig>,
}

/// One layer entry from the `[[layers]]` tables.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerConfig {
    pub name: String,
    pub source_file: String,
    /// Output file name; defaults to `<name>.geojson`.
    #[serde(default)]
    pub output_name: Option<String>,
    #[serde(default)]
    pub description: String,
}

fn default_target_crs() -> String {
    "EPSG:4326".to_string()
}

fn default_tolerance() -> f64 {
    1e-5
}

fn default_simplify_method() -> String {
    "visvalingam".to_string()
}

fn default_precision() -> u32 {
    6
}

fn default_raw_dir() -> PathBuf {
    PathBuf::from("data/raw")
}

fn default_processed_dir() -> PathBuf {
    PathBuf::from("data/processed")
}

fn default_backup_dir() -> PathBuf {
    PathBuf::from("backup")
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

pub fn parse_simplify_method(s: &str) -> Result<SimplifyMethod> {
    match s.to_lowercase().as_str() {
        "visvalingam" | "vw" => Ok(SimplifyMethod::VisvalingamPreserve),
        "douglas-peucker" | "dp" => Ok(SimplifyMethod::DouglasPeucker),
        _ => anyhow::bail!("Unknown simplify method: {}. Use visvalingam or douglas-peucker.", s),
    }
}

impl RunConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: RunConfig = toml::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Create every directory the run writes to (and the raw directory, so
    /// a fresh checkout gets the expected layout).
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [
            &self.raw_data_dir,
            &self.processed_data_dir,
            &self.backup_dir,
            &self.log_dir,
        ] {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory {}", dir.display()))?;
        }
        Ok(())
    }

    /// Resolve the layer entries into concrete jobs.
    pub fn jobs(&self) -> Vec<LayerJob> {
        self.layers
            .iter()
            .map(|layer| {
                let output_name = layer
                    .output_name
                    .clone()
                    .unwrap_or_else(|| format!("{}.geojson", layer.name));
                LayerJob {
                    name: layer.name.clone(),
                    source: self.raw_data_dir.join(&layer.source_file),
                    output: self.processed_data_dir.join(output_name),
                    description: layer.description.clone(),
                }
            })
            .collect()
    }
}
