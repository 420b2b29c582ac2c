//! # GeoFlow Core
//!
//! Core types and I/O for the GeoFlow vector conversion pipeline.
//!
//! This crate provides:
//! - `Feature` / `FeatureCollection`: the vector data model
//! - `Crs`: EPSG-coded coordinate reference systems
//! - I/O for GeoPackage and GeoJSON sources, plus the minified GeoJSON writer

pub mod crs;
pub mod error;
pub mod io;
pub mod vector;

pub use crs::Crs;
pub use error::{Error, Result};
pub use vector::{AttributeValue, Feature, FeatureCollection};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::Crs;
    pub use crate::error::{Error, Result};
    pub use crate::vector::{AttributeValue, Feature, FeatureCollection};
}
