//! # GeoFlow Pipeline
//!
//! The per-layer conversion pipeline: validate and repair geometries,
//! reproject to the target CRS, simplify, clean attributes, export minified
//! GeoJSON, round coordinate precision, and archive the previous output.
//!
//! ## Stage order
//!
//! Simplification runs after reprojection on purpose: the tolerance is a
//! distance in the units of the current CRS, and the configuration expresses
//! it in target-CRS units (degrees for a geographic target).

pub mod attributes;
pub mod backup;
pub mod error;
pub mod layer;
pub mod repair;
pub mod reproject;
pub mod rounding;
pub mod simplify;
pub mod vertices;

pub use error::{Error, Result};
pub use layer::{run_all, LayerJob, PipelineParams, RunSummary, Stage};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::attributes::{clean_collection, CleanParams};
    pub use crate::backup::backup_existing;
    pub use crate::error::{Error, Result};
    pub use crate::layer::{run_all, LayerJob, PipelineParams, RunSummary};
    pub use crate::repair::repair_collection;
    pub use crate::reproject::reproject_collection;
    pub use crate::rounding::{round_coords, round_document};
    pub use crate::simplify::{simplify_collection, SimplifyMethod, SimplifyParams};
    pub use crate::vertices::{count_vertices, total_vertices};
}
